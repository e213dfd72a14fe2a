use crate::pool::NotePools;
use crate::registry::ActiveRegistry;
use crate::visual::Scene;
use log::debug;

/// Reclaim every dead slot: hide its visual, return it to its pool, and
/// compact the registry to the live slots in their previous order.
///
/// Liveness is only read here, never computed. Returns the number reclaimed.
pub fn sweep(
    registry: &mut ActiveRegistry,
    pools: &mut NotePools,
    scene: &mut dyn Scene,
) -> usize {
    let reclaimed = registry.sweep(|mut slot| {
        slot.deactivate(scene);
        pools.reclaim(slot);
    });
    if reclaimed > 0 {
        debug!(
            "sweep: reclaimed {} slots, {} still active",
            reclaimed,
            registry.len()
        );
    }
    reclaimed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Note, NoteKind};
    use crate::visual::HeadlessScene;

    #[test]
    fn test_dead_slots_return_to_their_pools() {
        let mut scene = HeadlessScene::new();
        let mut pools = NotePools::default();
        let mut reg = ActiveRegistry::new();

        let notes = [
            Note::short(100.0, 0),
            Note::long(200.0, 900.0, 1),
            Note::short(300.0, 2),
        ];
        for note in notes {
            let mut slot = pools.checkout(note.kind, &mut scene);
            slot.place(note, 0.0, 0.0, 0.01, &mut scene);
            slot.activate(&mut scene);
            if note.time != 300.0 {
                slot.kill();
            }
            reg.push(slot);
        }

        assert_eq!(sweep(&mut reg, &mut pools, &mut scene), 2);
        assert_eq!(reg.len(), 1);
        assert!(reg.iter().all(|s| s.is_alive()));
        assert_eq!(pools.short.count_inactive(), 1);
        assert_eq!(pools.long.count_inactive(), 1);
        assert_eq!(scene.active_count(), 1, "reclaimed visuals are hidden");

        let survivor = reg.iter().next().unwrap();
        assert_eq!(survivor.kind(), NoteKind::Short);
        assert!(!reg.contains(NoteKind::Long, crate::slot::SlotId(0)));
    }
}
