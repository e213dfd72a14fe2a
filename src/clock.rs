use crate::types::TimeMs;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Playback position source. Polled, never pushed.
///
/// Mostly monotonic, but may pause or jump on seek; consumers must tolerate
/// both.
pub trait AudioClock: Send + Sync {
    fn now_ms(&self) -> TimeMs;
}

// ─── Session clock ──────────────────────────────────────────────────────────

/// Monotonic wall clock for the play session.
#[derive(Clone)]
pub struct SessionClock {
    start: Instant,
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> TimeMs {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Wall-driven playback clock ─────────────────────────────────────────────

struct WallState {
    /// Playback position at `anchor`
    base_ms: TimeMs,
    anchor: Instant,
    paused: bool,
}

/// Stand-in for an audio device clock: advances with wall time from a start
/// offset, and supports seek and pause.
pub struct WallClock {
    state: Mutex<WallState>,
}

impl WallClock {
    pub fn new(start_ms: TimeMs) -> Self {
        Self {
            state: Mutex::new(WallState {
                base_ms: start_ms,
                anchor: Instant::now(),
                paused: false,
            }),
        }
    }

    pub fn seek(&self, position_ms: TimeMs) {
        if let Ok(mut s) = self.state.lock() {
            s.base_ms = position_ms;
            s.anchor = Instant::now();
        }
    }

    pub fn pause(&self) {
        if let Ok(mut s) = self.state.lock() {
            if !s.paused {
                s.base_ms += s.anchor.elapsed().as_secs_f64() * 1000.0;
                s.paused = true;
            }
        }
    }

    pub fn resume(&self) {
        if let Ok(mut s) = self.state.lock() {
            if s.paused {
                s.anchor = Instant::now();
                s.paused = false;
            }
        }
    }
}

impl AudioClock for WallClock {
    fn now_ms(&self) -> TimeMs {
        match self.state.lock() {
            Ok(s) if s.paused => s.base_ms,
            Ok(s) => s.base_ms + s.anchor.elapsed().as_secs_f64() * 1000.0,
            Err(poisoned) => poisoned.into_inner().base_ms,
        }
    }
}

// ─── Manual clock ───────────────────────────────────────────────────────────

/// Externally driven clock. Lock-free; shareable across worker threads.
#[derive(Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    pub fn new(position_ms: TimeMs) -> Self {
        Self {
            bits: AtomicU64::new(position_ms.to_bits()),
        }
    }

    pub fn set(&self, position_ms: TimeMs) {
        self.bits.store(position_ms.to_bits(), Ordering::Release);
    }

    pub fn advance(&self, delta_ms: TimeMs) {
        let _ = self
            .bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |b| {
                Some((f64::from_bits(b) + delta_ms).to_bits())
            });
    }
}

impl AudioClock for ManualClock {
    fn now_ms(&self) -> TimeMs {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_manual_clock_set_and_advance() {
        let clock = ManualClock::new(100.0);
        assert_eq!(clock.now_ms(), 100.0);
        clock.advance(50.5);
        assert_eq!(clock.now_ms(), 150.5);
        clock.set(10.0);
        assert_eq!(clock.now_ms(), 10.0);
    }

    #[test]
    fn test_wall_clock_pause_freezes_position() {
        let clock = WallClock::new(1000.0);
        clock.pause();
        let frozen = clock.now_ms();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(clock.now_ms(), frozen);
        assert!(frozen >= 1000.0);

        clock.resume();
        thread::sleep(Duration::from_millis(20));
        assert!(clock.now_ms() > frozen);
    }

    #[test]
    fn test_wall_clock_seek_backward() {
        let clock = WallClock::new(5000.0);
        clock.seek(100.0);
        let now = clock.now_ms();
        assert!((100.0..1000.0).contains(&now), "got {}", now);
    }
}
