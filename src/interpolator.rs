use crate::registry::ActiveRegistry;
use crate::types::TimeMs;
use crate::visual::Scene;

/// Re-derive every registered slot's position from the current audio time.
///
/// Dead-but-unswept slots are moved too. No liveness checks, no pool access.
/// Returns the number of slots touched.
pub fn interpolate(
    registry: &mut ActiveRegistry,
    scene: &mut dyn Scene,
    audio_ms: TimeMs,
    scale: f32,
) -> usize {
    let mut touched = 0;
    for slot in registry.iter_mut() {
        slot.interpolate(audio_ms, scale, scene);
        touched += 1;
    }
    touched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::NotePools;
    use crate::types::{Note, NoteKind};
    use crate::visual::HeadlessScene;

    #[test]
    fn test_moves_live_and_dead_slots() {
        let mut scene = HeadlessScene::new();
        let mut pools = NotePools::default();
        let mut reg = ActiveRegistry::new();

        for (t, kill) in [(1000.0, false), (2000.0, true)] {
            let mut slot = pools.checkout(NoteKind::Short, &mut scene);
            slot.place(Note::short(t, 0), -1.5, 0.0, 0.01, &mut scene);
            slot.activate(&mut scene);
            if kill {
                slot.kill();
            }
            reg.push(slot);
        }

        assert_eq!(interpolate(&mut reg, &mut scene, 500.0, 0.01), 2);
        let ys: Vec<f32> = reg.iter().map(|s| s.positions()[0].y).collect();
        assert!((ys[0] - 5.0).abs() < 1e-5);
        assert!((ys[1] - 15.0).abs() < 1e-5, "dead slot still interpolated");
        assert_eq!(pools.short.count_inactive(), 0, "no pool interaction");
    }
}
