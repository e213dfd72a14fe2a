//! Chart model: the read-only note sequence and bar length for a session.
//!
//! Charts are validated once, before a session starts. Lane indices, time
//! ordering and long-note tails are checked here so the hot path can index
//! without checks.

use crate::error::FieldError;
use crate::types::*;
use log::info;
use serde::Deserialize;
use std::path::Path;

/// Validated chart: notes in non-decreasing time order plus bar length.
#[derive(Debug, Clone)]
pub struct Chart {
    pub title: String,
    pub bar_duration_ms: TimeMs,
    pub notes: Vec<Note>,
}

/// On-disk chart shape. Either `bar_duration_ms` or `bpm` must be present.
///
/// Lanes are numbered from 0, matching indices into the field's
/// `lane_positions`. Charts exported with lanes counted from 1 need every
/// lane shifted down by one before loading.
#[derive(Debug, Deserialize)]
struct ChartFile {
    #[serde(default)]
    title: String,
    bar_duration_ms: Option<f64>,
    bpm: Option<f64>,
    #[serde(default = "default_beats_per_bar")]
    beats_per_bar: f64,
    #[serde(default)]
    notes: Vec<NoteRecord>,
}

#[derive(Debug, Deserialize)]
struct NoteRecord {
    time: f64,
    /// 0-based lane index.
    lane: usize,
    kind: NoteKind,
    tail: Option<f64>,
}

fn default_beats_per_bar() -> f64 {
    4.0
}

impl Chart {
    /// Build a chart without lane validation. Use [`Chart::validate`] with the
    /// field's lane count before playing it.
    pub fn new(title: impl Into<String>, bar_duration_ms: TimeMs, notes: Vec<Note>) -> Self {
        Self {
            title: title.into(),
            bar_duration_ms,
            notes,
        }
    }

    /// Bar length for a tempo: one beat is `60000 / bpm` ms.
    pub fn bar_duration_for_bpm(bpm: f64, beats_per_bar: f64) -> TimeMs {
        60_000.0 / bpm * beats_per_bar
    }

    pub fn load(path: &Path) -> Result<Self, FieldError> {
        let data = std::fs::read_to_string(path)?;
        let chart = Self::from_json(&data)?;
        info!(
            "Loaded chart {:?} from {:?}: {} notes, bar {:.1}ms",
            chart.title,
            path,
            chart.notes.len(),
            chart.bar_duration_ms
        );
        Ok(chart)
    }

    /// Parse a chart file. Short notes ignore any `tail`; long notes require one.
    pub fn from_json(data: &str) -> Result<Self, FieldError> {
        let file: ChartFile = serde_json::from_str(data)?;

        let bar_duration_ms = match (file.bar_duration_ms, file.bpm) {
            (Some(ms), _) => ms,
            (None, Some(bpm)) if bpm > 0.0 => Self::bar_duration_for_bpm(bpm, file.beats_per_bar),
            (None, Some(bpm)) => {
                return Err(FieldError::Parse(format!("invalid bpm {}", bpm)));
            }
            (None, None) => {
                return Err(FieldError::Parse(
                    "missing \"bar_duration_ms\" or \"bpm\"".into(),
                ));
            }
        };

        let mut notes = Vec::with_capacity(file.notes.len());
        for (index, rec) in file.notes.into_iter().enumerate() {
            let note = match rec.kind {
                NoteKind::Short => Note::short(rec.time, rec.lane),
                NoteKind::Long => {
                    let tail = rec.tail.ok_or_else(|| {
                        FieldError::Parse(format!("note {}: long note without \"tail\"", index))
                    })?;
                    Note::long(rec.time, tail, rec.lane)
                }
            };
            notes.push(note);
        }

        Ok(Self::new(file.title, bar_duration_ms, notes))
    }

    /// Check the invariants the generator relies on.
    pub fn validate(&self, lane_count: usize) -> Result<(), FieldError> {
        if !(self.bar_duration_ms.is_finite() && self.bar_duration_ms > 0.0) {
            return Err(FieldError::InvalidBarDuration(self.bar_duration_ms));
        }

        let mut prev = 0.0;
        for (index, note) in self.notes.iter().enumerate() {
            if note.lane >= lane_count {
                return Err(FieldError::InvalidLane {
                    index,
                    lane: note.lane,
                    lanes: lane_count,
                });
            }
            if !note.time.is_finite() || note.time < 0.0 {
                return Err(FieldError::NegativeTime {
                    index,
                    time: note.time,
                });
            }
            if note.time < prev {
                return Err(FieldError::NonMonotonic {
                    index,
                    time: note.time,
                    prev,
                });
            }
            if note.kind == NoteKind::Long && !(note.tail > note.time) {
                return Err(FieldError::InvalidTail {
                    index,
                    time: note.time,
                    tail: note.tail,
                });
            }
            prev = note.time;
        }
        Ok(())
    }

    /// Time of the last note end, or 0 for an empty chart.
    pub fn length_ms(&self) -> TimeMs {
        self.notes
            .iter()
            .map(Note::end_time)
            .fold(0.0, f64::max)
    }

    pub fn count(&self, kind: NoteKind) -> usize {
        self.notes.iter().filter(|n| n.kind == kind).count()
    }
}
