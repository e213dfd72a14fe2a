use crate::slot::{Slot, SlotId};
use crate::types::NoteKind;

/// Slots currently checked out of the pools, in generation order.
///
/// The registry owns its slots; the only way out is [`ActiveRegistry::sweep`],
/// which hands dead slots to a reclaim callback.
#[derive(Debug, Default)]
pub struct ActiveRegistry {
    slots: Vec<Slot>,
    /// Reused by `sweep` so compaction does not allocate
    scratch: Vec<Slot>,
}

impl ActiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            scratch: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, slot: Slot) {
        debug_assert!(
            !self.contains(slot.kind(), slot.id()),
            "{:?} slot {} registered twice",
            slot.kind(),
            slot.id().0
        );
        self.slots.push(slot);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, kind: NoteKind, id: SlotId) -> bool {
        self.slots.iter().any(|s| s.kind() == kind && s.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Slot> {
        self.slots.iter_mut()
    }

    /// Keep live slots in their relative order; pass every dead slot to
    /// `reclaim`. Returns the number of slots reclaimed.
    pub fn sweep(&mut self, mut reclaim: impl FnMut(Slot)) -> usize {
        let mut reclaimed = 0;
        self.scratch.clear();
        for slot in self.slots.drain(..) {
            if slot.is_alive() {
                self.scratch.push(slot);
            } else {
                reclaim(slot);
                reclaimed += 1;
            }
        }
        std::mem::swap(&mut self.slots, &mut self.scratch);
        reclaimed
    }
}
