//! Lazily-growing reuse pools for note slots.
//!
//! A pool owns a free list of constructed slots plus a ledger of which ids are
//! checked out. Ownership moves out on `get` and back on `release`, so a slot
//! can only ever be in one place; the ledger turns a release into the wrong
//! pool, or of a slot that was never handed out, into a loud panic.

use crate::slot::{LongSlot, Pooled, ShortSlot, Slot, SlotId};
use crate::types::*;
use crate::visual::Scene;
use log::debug;

pub struct Pool<T: Pooled> {
    free: Vec<T>,
    /// Indexed by SlotId; true while the slot is outside the free list
    checked_out: Vec<bool>,
}

impl<T: Pooled> Pool<T> {
    /// `capacity` is a hint for the free list; nothing is pre-built.
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            checked_out: Vec::with_capacity(capacity),
        }
    }

    /// Hand out a free slot, building a new one through the scene if none is
    /// left.
    pub fn get<S: Scene + ?Sized>(&mut self, scene: &mut S) -> T {
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                let id = SlotId(self.checked_out.len());
                let visual = scene.create(T::VARIANT);
                self.checked_out.push(false);
                debug!("{:?} pool grew to {} slots", T::VARIANT, self.checked_out.len());
                T::construct(id, visual)
            }
        };
        self.checked_out[slot.slot_id().0] = true;
        slot
    }

    /// Return a slot to the free list.
    ///
    /// Panics if the slot is not currently checked out from this pool.
    pub fn release(&mut self, slot: T) {
        let id = slot.slot_id();
        match self.checked_out.get_mut(id.0) {
            Some(out) if *out => *out = false,
            Some(_) => panic!("{:?} slot {} released twice", T::VARIANT, id.0),
            None => panic!("{:?} slot {} does not belong to this pool", T::VARIANT, id.0),
        }
        self.free.push(slot);
    }

    /// Slots resting in the free list.
    pub fn count_inactive(&self) -> usize {
        self.free.len()
    }

    /// Slots currently handed out.
    pub fn count_active(&self) -> usize {
        self.count_all() - self.count_inactive()
    }

    /// Every slot this pool has ever built.
    pub fn count_all(&self) -> usize {
        self.checked_out.len()
    }
}

/// The two variant pools, selected by note kind.
pub struct NotePools {
    pub short: Pool<ShortSlot>,
    pub long: Pool<LongSlot>,
}

impl NotePools {
    pub fn new(short_capacity: usize, long_capacity: usize) -> Self {
        Self {
            short: Pool::new(short_capacity),
            long: Pool::new(long_capacity),
        }
    }

    pub fn checkout<S: Scene + ?Sized>(&mut self, kind: NoteKind, scene: &mut S) -> Slot {
        match kind {
            NoteKind::Short => Slot::Short(self.short.get(scene)),
            NoteKind::Long => Slot::Long(self.long.get(scene)),
        }
    }

    pub fn reclaim(&mut self, slot: Slot) {
        match slot {
            Slot::Short(s) => self.short.release(s),
            Slot::Long(s) => self.long.release(s),
        }
    }

    pub fn stats(&self, active: usize) -> PoolStats {
        PoolStats {
            short_idle: self.short.count_inactive(),
            short_total: self.short.count_all(),
            long_idle: self.long.count_inactive(),
            long_total: self.long.count_all(),
            active,
        }
    }
}

impl Default for NotePools {
    fn default() -> Self {
        Self::new(DEFAULT_SHORT_POOL_CAPACITY, DEFAULT_LONG_POOL_CAPACITY)
    }
}
