use crate::chart::Chart;
use crate::types::*;

/// Names accepted by [`demo_chart`].
pub const DEMO_NAMES: [&str; 3] = ["basic", "stream", "holds"];

/// Build one of the built-in charts, for running without a chart file.
pub fn demo_chart(name: &str) -> Option<Chart> {
    match name {
        "basic" => Some(basic()),
        "stream" => Some(stream()),
        "holds" => Some(holds()),
        _ => None,
    }
}

/// Eight bars at 120 BPM: quarter notes walking across the lanes, with a
/// long note closing every second bar.
fn basic() -> Chart {
    let bar = Chart::bar_duration_for_bpm(120.0, 4.0);
    let beat = bar / 4.0;
    let mut notes = Vec::new();

    for b in 0..8 {
        let start = b as f64 * bar;
        let beats = if b % 2 == 1 { 3 } else { 4 };
        for i in 0..beats {
            notes.push(Note::short(start + i as f64 * beat, (b + i) % 4));
        }
        if b % 2 == 1 {
            let t = start + 3.0 * beat;
            notes.push(Note::long(t, t + 1.5 * beat, 3 - (b / 2) % 4));
        }
    }
    Chart::new("basic", bar, notes)
}

/// Sixteenth-note stream at 150 BPM, short notes only.
fn stream() -> Chart {
    let bar = Chart::bar_duration_for_bpm(150.0, 4.0);
    let step = bar / 16.0;
    let pattern = [0, 1, 2, 3, 2, 1];
    let notes = (0..16 * 24)
        .map(|i| Note::short(i as f64 * step, pattern[i % pattern.len()]))
        .collect();
    Chart::new("stream", bar, notes)
}

/// Overlapping holds in all lanes with short notes between them.
fn holds() -> Chart {
    let bar = Chart::bar_duration_for_bpm(90.0, 4.0);
    let beat = bar / 4.0;
    let mut notes = Vec::new();

    for b in 0..12 {
        let start = b as f64 * bar;
        let lane = b % 4;
        notes.push(Note::long(start, start + bar * 1.5, lane));
        notes.push(Note::short(start + beat, (lane + 2) % 4));
        notes.push(Note::long(start + 2.0 * beat, start + 3.5 * beat, (lane + 1) % 4));
        notes.push(Note::short(start + 3.0 * beat, (lane + 3) % 4));
    }
    Chart::new("holds", bar, notes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_demo_validates() {
        for name in DEMO_NAMES {
            let chart = demo_chart(name).unwrap();
            assert!(!chart.notes.is_empty(), "{} is empty", name);
            assert_eq!(chart.validate(DEFAULT_LANE_POSITIONS.len()), Ok(()), "{}", name);
        }
    }

    #[test]
    fn test_unknown_demo() {
        assert!(demo_chart("e9").is_none());
    }

    #[test]
    fn test_stream_is_short_only() {
        let chart = demo_chart("stream").unwrap();
        assert_eq!(chart.count(NoteKind::Short), 16 * 24);
        assert_eq!(chart.count(NoteKind::Long), 0);
        assert_eq!(chart.bar_duration_ms, 1600.0);
    }
}
