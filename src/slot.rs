//! Pooled visual slots: one reusable on-screen note instance each.
//!
//! A slot is built once by its pool and then cycles through
//! place → activate → arm → interpolate … → (dies) → deactivate → back to
//! the pool. Short and long slots differ only in how many points they carry,
//! so they share [`SlotCore`] and differ by enum variant.

use crate::liveness::LivenessRule;
use crate::types::*;
use crate::visual::{Scene, Variant, VisualHandle};

/// Construction index of a slot within its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub usize);

/// State shared by both slot variants.
#[derive(Debug)]
pub struct SlotCore {
    id: SlotId,
    visual: VisualHandle,
    /// Note currently assigned; None while resting in a pool
    note: Option<Note>,
    alive: bool,
    /// Set by `arm()`; liveness is only evaluated once armed
    armed: bool,
    lane_x: f32,
}

impl SlotCore {
    fn new(id: SlotId, visual: VisualHandle) -> Self {
        Self {
            id,
            visual,
            note: None,
            alive: false,
            armed: false,
            lane_x: 0.0,
        }
    }
}

#[derive(Debug)]
pub struct ShortSlot {
    core: SlotCore,
    position: Point,
}

#[derive(Debug)]
pub struct LongSlot {
    core: SlotCore,
    /// [head, tail]
    ends: [Point; 2],
}

/// Pool-side construction contract. Slots are never built any other way.
pub trait Pooled: Sized {
    const VARIANT: Variant;
    fn construct(id: SlotId, visual: VisualHandle) -> Self;
    fn slot_id(&self) -> SlotId;
}

impl Pooled for ShortSlot {
    const VARIANT: Variant = Variant::Short;

    fn construct(id: SlotId, visual: VisualHandle) -> Self {
        Self {
            core: SlotCore::new(id, visual),
            position: Point::default(),
        }
    }

    fn slot_id(&self) -> SlotId {
        self.core.id
    }
}

impl Pooled for LongSlot {
    const VARIANT: Variant = Variant::Long;

    fn construct(id: SlotId, visual: VisualHandle) -> Self {
        Self {
            core: SlotCore::new(id, visual),
            ends: [Point::default(); 2],
        }
    }

    fn slot_id(&self) -> SlotId {
        self.core.id
    }
}

impl LongSlot {
    pub fn head(&self) -> Point {
        self.ends[0]
    }

    pub fn tail(&self) -> Point {
        self.ends[1]
    }
}

impl ShortSlot {
    pub fn position(&self) -> Point {
        self.position
    }
}

/// A checked-out slot of either variant.
#[derive(Debug)]
pub enum Slot {
    Short(ShortSlot),
    Long(LongSlot),
}

impl Slot {
    fn core(&self) -> &SlotCore {
        match self {
            Slot::Short(s) => &s.core,
            Slot::Long(s) => &s.core,
        }
    }

    fn core_mut(&mut self) -> &mut SlotCore {
        match self {
            Slot::Short(s) => &mut s.core,
            Slot::Long(s) => &mut s.core,
        }
    }

    pub fn id(&self) -> SlotId {
        self.core().id
    }

    pub fn kind(&self) -> NoteKind {
        match self {
            Slot::Short(_) => NoteKind::Short,
            Slot::Long(_) => NoteKind::Long,
        }
    }

    pub fn visual(&self) -> VisualHandle {
        self.core().visual
    }

    pub fn note(&self) -> Option<&Note> {
        self.core().note.as_ref()
    }

    pub fn is_alive(&self) -> bool {
        self.core().alive
    }

    pub fn is_armed(&self) -> bool {
        self.core().armed
    }

    /// Current points: one for short slots, head and tail for long slots.
    pub fn positions(&self) -> &[Point] {
        match self {
            Slot::Short(s) => std::slice::from_ref(&s.position),
            Slot::Long(s) => &s.ends[..],
        }
    }

    /// Assign a note and compute its initial position from `audio_ms`.
    ///
    /// Panics if the note kind does not match the slot variant.
    pub fn place(
        &mut self,
        note: Note,
        lane_x: f32,
        audio_ms: TimeMs,
        scale: f32,
        scene: &mut dyn Scene,
    ) {
        assert_eq!(
            note.kind,
            self.kind(),
            "{} placed into a {:?} slot",
            note,
            self.kind()
        );
        let core = self.core_mut();
        core.note = Some(note);
        core.lane_x = lane_x;
        self.interpolate(audio_ms, scale, scene);
    }

    pub fn activate(&mut self, scene: &mut dyn Scene) {
        let core = self.core_mut();
        core.alive = true;
        scene.set_active(core.visual, true);
    }

    /// Start the slot's own progress logic. From here on the simulation tick
    /// may mark it dead.
    pub fn arm(&mut self) {
        self.core_mut().armed = true;
    }

    /// Re-derive positions from the current audio time.
    pub fn interpolate(&mut self, audio_ms: TimeMs, scale: f32, scene: &mut dyn Scene) {
        let Some(note) = self.core().note else {
            return;
        };
        let x = self.core().lane_x;
        match self {
            Slot::Short(s) => {
                s.position = Point::new(x, scroll_offset(note.time, audio_ms, scale));
                scene.set_positions(s.core.visual, std::slice::from_ref(&s.position));
            }
            Slot::Long(s) => {
                s.ends = [
                    Point::new(x, scroll_offset(note.time, audio_ms, scale)),
                    Point::new(x, scroll_offset(note.tail, audio_ms, scale)),
                ];
                scene.set_positions(s.core.visual, &s.ends);
            }
        }
    }

    /// Simulation step: an armed, alive slot dies when the rule says so.
    /// Returns true on the alive → dead transition.
    pub fn update(&mut self, audio_ms: TimeMs, rule: &dyn LivenessRule) -> bool {
        let core = self.core_mut();
        if !(core.armed && core.alive) {
            return false;
        }
        match core.note {
            Some(ref note) if rule.expired(note, audio_ms) => {
                core.alive = false;
                core.armed = false;
                true
            }
            _ => false,
        }
    }

    /// Force the liveness flag. Used by gameplay collaborators that resolve a
    /// note early (e.g. a hit).
    pub fn kill(&mut self) {
        let core = self.core_mut();
        core.alive = false;
        core.armed = false;
    }

    /// Hide the visual and clear per-note state before returning to a pool.
    pub fn deactivate(&mut self, scene: &mut dyn Scene) {
        let core = self.core_mut();
        scene.set_active(core.visual, false);
        core.note = None;
        core.alive = false;
        core.armed = false;
    }

    pub fn view(&self) -> Option<SlotView> {
        let note = self.note()?;
        Some(SlotView {
            id: self.id().0,
            kind: note.kind,
            lane: note.lane,
            time: note.time,
            tail: note.tail,
            alive: self.is_alive(),
            positions: self.positions().to_vec(),
        })
    }
}
