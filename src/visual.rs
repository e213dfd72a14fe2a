//! Scene capability interface.
//!
//! The note field never touches a renderer directly. It creates visuals,
//! toggles them, and moves them through [`Scene`]; the host decides what a
//! visual is (sprite, mesh, head/tail/line triple, terminal glyph).

use crate::types::Point;
use log::trace;
use serde::{Deserialize, Serialize};

/// Opaque reference to a backing visual owned by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisualHandle(pub u32);

/// Structural shape of a backing visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    /// Single note head
    Short,
    /// Head, tail, and a line segment between them
    Long,
}

pub trait Scene: Send {
    /// Construct a new inactive visual parented under the note container.
    /// Only called on pool growth.
    fn create(&mut self, variant: Variant) -> VisualHandle;
    fn set_active(&mut self, handle: VisualHandle, active: bool);
    /// One point for short visuals, head then tail for long visuals.
    fn set_positions(&mut self, handle: VisualHandle, positions: &[Point]);
}

/// State of one visual inside a [`HeadlessScene`].
#[derive(Debug, Clone)]
pub struct VisualRecord {
    pub variant: Variant,
    pub active: bool,
    pub positions: Vec<Point>,
    /// Number of `set_positions` calls received
    pub moves: u64,
}

/// In-memory scene with no rendering. Records everything it is told.
#[derive(Debug, Default)]
pub struct HeadlessScene {
    visuals: Vec<VisualRecord>,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visual(&self, handle: VisualHandle) -> Option<&VisualRecord> {
        self.visuals.get(handle.0 as usize)
    }

    pub fn created(&self) -> usize {
        self.visuals.len()
    }

    pub fn created_of(&self, variant: Variant) -> usize {
        self.visuals.iter().filter(|v| v.variant == variant).count()
    }

    pub fn active_count(&self) -> usize {
        self.visuals.iter().filter(|v| v.active).count()
    }
}

impl Scene for HeadlessScene {
    fn create(&mut self, variant: Variant) -> VisualHandle {
        let handle = VisualHandle(self.visuals.len() as u32);
        let points = match variant {
            Variant::Short => 1,
            Variant::Long => 2,
        };
        self.visuals.push(VisualRecord {
            variant,
            active: false,
            positions: vec![Point::default(); points],
            moves: 0,
        });
        trace!("scene: created {:?} visual {}", variant, handle.0);
        handle
    }

    fn set_active(&mut self, handle: VisualHandle, active: bool) {
        if let Some(v) = self.visuals.get_mut(handle.0 as usize) {
            v.active = active;
        }
    }

    fn set_positions(&mut self, handle: VisualHandle, positions: &[Point]) {
        if let Some(v) = self.visuals.get_mut(handle.0 as usize) {
            v.positions.clear();
            v.positions.extend_from_slice(positions);
            v.moves += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_scene_records_state() {
        let mut scene = HeadlessScene::new();
        let a = scene.create(Variant::Short);
        let b = scene.create(Variant::Long);
        assert_ne!(a, b);
        assert_eq!(scene.created(), 2);
        assert_eq!(scene.created_of(Variant::Long), 1);
        assert_eq!(scene.visual(b).unwrap().positions.len(), 2);

        scene.set_active(a, true);
        scene.set_positions(a, &[Point::new(0.5, 3.0)]);
        let rec = scene.visual(a).unwrap();
        assert!(rec.active);
        assert_eq!(rec.positions, vec![Point::new(0.5, 3.0)]);
        assert_eq!(rec.moves, 1);
        assert_eq!(scene.active_count(), 1);
    }
}
