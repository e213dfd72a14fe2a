use crate::types::*;

/// Decides when a note on screen has nothing left to do.
///
/// Evaluated by the simulation tick for armed, alive slots only. Gameplay
/// rules (judgement, hold resolution) plug in here.
pub trait LivenessRule: Send {
    fn expired(&self, note: &Note, audio_ms: TimeMs) -> bool;
}

impl<F> LivenessRule for F
where
    F: Fn(&Note, TimeMs) -> bool + Send,
{
    fn expired(&self, note: &Note, audio_ms: TimeMs) -> bool {
        self(note, audio_ms)
    }
}

/// Notes die once their end time is more than `late_window_ms` behind the
/// judgement line. Long notes resolve at the tail.
#[derive(Debug, Clone, Copy)]
pub struct JudgementLine {
    pub late_window_ms: TimeMs,
}

impl Default for JudgementLine {
    fn default() -> Self {
        Self {
            late_window_ms: 200.0,
        }
    }
}

impl LivenessRule for JudgementLine {
    fn expired(&self, note: &Note, audio_ms: TimeMs) -> bool {
        audio_ms - note.end_time() > self.late_window_ms
    }
}
