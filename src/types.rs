use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds, shared by chart time and audio playback time.
pub type TimeMs = f64;

// ─── Chart events ───────────────────────────────────────────────────────────

/// Note variant. Serializes lowercase ("short", "long") to match chart files.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    /// Single tap, one on-screen point
    Short,
    /// Hold with head and tail, drawn as a segment
    Long,
}

/// One immutable chart event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Note {
    /// Chart-relative hit time (ms)
    pub time: TimeMs,
    /// Release time of a long note (ms). Equal to `time` for short notes.
    pub tail: TimeMs,
    /// 0-based lane index into the configured lane layout
    pub lane: usize,
    pub kind: NoteKind,
}

impl Note {
    pub fn short(time: TimeMs, lane: usize) -> Self {
        Self {
            time,
            tail: time,
            lane,
            kind: NoteKind::Short,
        }
    }

    pub fn long(time: TimeMs, tail: TimeMs, lane: usize) -> Self {
        Self {
            time,
            tail,
            lane,
            kind: NoteKind::Long,
        }
    }

    /// Chart time after which the note has nothing left to show.
    pub fn end_time(&self) -> TimeMs {
        match self.kind {
            NoteKind::Short => self.time,
            NoteKind::Long => self.tail,
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NoteKind::Short => write!(f, "short@{:.0}ms lane {}", self.time, self.lane),
            NoteKind::Long => write!(
                f,
                "long@{:.0}..{:.0}ms lane {}",
                self.time, self.tail, self.lane
            ),
        }
    }
}

// ─── Geometry ───────────────────────────────────────────────────────────────

/// Scene-space point. `x` is the lane axis, `y` the scroll axis
/// (distance above the judgement line).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Motion-axis position of a chart time seen from `audio_ms`.
pub fn scroll_offset(time: TimeMs, audio_ms: TimeMs, scale: f32) -> f32 {
    ((time - audio_ms) * scale as f64) as f32
}

// ─── Snapshots ──────────────────────────────────────────────────────────────

/// Pool occupancy counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoolStats {
    pub short_idle: usize,
    pub short_total: usize,
    pub long_idle: usize,
    pub long_total: usize,
    /// Slots currently held by the active registry
    pub active: usize,
}

/// Renderer-facing view of one registered slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotView {
    pub id: usize,
    pub kind: NoteKind,
    pub lane: usize,
    pub time: TimeMs,
    pub tail: TimeMs,
    pub alive: bool,
    /// One point for short notes, head then tail for long notes
    pub positions: Vec<Point>,
}

/// Complete note-field state at one audio instant.
/// Produced after interpolation, consumed by displays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldFrame {
    pub audio_ms: TimeMs,
    pub bar: u32,
    /// Index of the next chart note not yet materialized
    pub cursor: usize,
    pub total_notes: usize,
    pub slots: Vec<SlotView>,
    pub pools: PoolStats,
}

impl fmt::Display for FieldFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>9.1}ms  bar={:<3} notes {}/{}  live={}  short {}/{}  long {}/{}",
            self.audio_ms,
            self.bar,
            self.cursor,
            self.total_notes,
            self.slots.iter().filter(|s| s.alive).count(),
            self.pools.short_idle,
            self.pools.short_total,
            self.pools.long_idle,
            self.pools.long_total,
        )
    }
}

// ─── Constants ──────────────────────────────────────────────────────────────

/// Default lane x-coordinates for a 4-lane field.
pub const DEFAULT_LANE_POSITIONS: [f32; 4] = [-1.5, -0.5, 0.5, 1.5];

/// Scene units per millisecond at 1x speed (one bar fills roughly the screen).
pub const DEFAULT_SCROLL_SCALE: f32 = 0.01;

/// Bars generated ahead of playback before the first generator tick.
pub const DEFAULT_INITIAL_BAR: u32 = 3;

pub const DEFAULT_SHORT_POOL_CAPACITY: usize = 256;
pub const DEFAULT_LONG_POOL_CAPACITY: usize = 64;
