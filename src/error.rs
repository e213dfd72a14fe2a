use std::fmt;
use std::io;

/// Startup errors: bad charts, bad configuration, unreadable files.
///
/// None of these are recoverable mid-session. Pool misuse is not represented
/// here; it is a programming error and panics.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldError {
    InvalidBarDuration(f64),
    InvalidLane { index: usize, lane: usize, lanes: usize },
    NegativeTime { index: usize, time: f64 },
    NonMonotonic { index: usize, time: f64, prev: f64 },
    InvalidTail { index: usize, time: f64, tail: f64 },
    InvalidInterval { name: &'static str, ms: f64 },
    InvalidConfig(String),
    Io(String),
    Parse(String),
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::InvalidBarDuration(ms) => {
                write!(f, "Invalid bar duration: {}ms", ms)
            }
            FieldError::InvalidLane { index, lane, lanes } => write!(
                f,
                "Note {}: lane {} out of range (field has {} lanes)",
                index, lane, lanes
            ),
            FieldError::NegativeTime { index, time } => {
                write!(f, "Note {}: negative time {}ms", index, time)
            }
            FieldError::NonMonotonic { index, time, prev } => write!(
                f,
                "Note {}: time {}ms is earlier than previous note at {}ms",
                index, time, prev
            ),
            FieldError::InvalidTail { index, time, tail } => write!(
                f,
                "Note {}: long note tail {}ms must be after head {}ms",
                index, tail, time
            ),
            FieldError::InvalidInterval { name, ms } => {
                write!(f, "Invalid {} interval: {}ms", name, ms)
            }
            FieldError::InvalidConfig(s) => write!(f, "Invalid config: {}", s),
            FieldError::Io(s) => write!(f, "I/O error: {}", s),
            FieldError::Parse(s) => write!(f, "Parse error: {}", s),
        }
    }
}

impl std::error::Error for FieldError {}

impl From<io::Error> for FieldError {
    fn from(e: io::Error) -> Self {
        FieldError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for FieldError {
    fn from(e: serde_json::Error) -> Self {
        FieldError::Parse(e.to_string())
    }
}
