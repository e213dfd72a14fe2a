//! Look-ahead generator. Materializes chart notes one bar ahead of playback.
//!
//! Two cursors walk the chart. `next` advances while notes fall inside the
//! window ending at `current_bar × bar_duration_ms`; everything in
//! `[prev, next)` is materialized and then `prev` catches up. Each note is
//! therefore emitted exactly once, in chart order, no matter how many bars a
//! single tick covers.

use crate::chart::Chart;
use crate::pool::NotePools;
use crate::registry::ActiveRegistry;
use crate::types::*;
use crate::visual::Scene;
use log::{debug, trace};
use std::ops::Range;

pub struct Generator {
    current_bar: u32,
    /// First chart index not yet materialized
    prev: usize,
    /// First chart index beyond the current window
    next: usize,
    scale: f32,
    lane_positions: Vec<f32>,
}

impl Generator {
    pub fn new(initial_bar: u32, scale: f32, lane_positions: Vec<f32>) -> Self {
        Self {
            current_bar: initial_bar,
            prev: 0,
            next: 0,
            scale,
            lane_positions,
        }
    }

    pub fn current_bar(&self) -> u32 {
        self.current_bar
    }

    /// `(prev, next)`. Equal after every scan.
    pub fn cursor(&self) -> (usize, usize) {
        (self.prev, self.next)
    }

    /// Upper bound of the look-ahead window in chart time.
    pub fn horizon_ms(&self, chart: &Chart) -> TimeMs {
        self.current_bar as f64 * chart.bar_duration_ms
    }

    pub fn is_exhausted(&self, chart: &Chart) -> bool {
        self.prev >= chart.notes.len()
    }

    /// Scene x-coordinate of a lane. Lanes are validated with the chart, so
    /// an out-of-range lane here is a bug and panics.
    pub fn lane_x(&self, lane: usize) -> f32 {
        self.lane_positions[lane]
    }

    /// Move the window forward by `bars`.
    pub fn advance_bars(&mut self, bars: u32) {
        self.current_bar = self.current_bar.saturating_add(bars);
    }

    /// Begin playback at `position_ms` instead of the chart start. The window
    /// moves forward by every bar already played, started or not, and notes
    /// that begin before the position are skipped. Returns the number skipped.
    pub fn seek_start(&mut self, chart: &Chart, position_ms: TimeMs) -> usize {
        if position_ms <= 0.0 {
            return 0;
        }
        let bars = (position_ms / chart.bar_duration_ms).ceil();
        self.advance_bars(bars.min(u32::MAX as f64) as u32);

        let notes = &chart.notes;
        let first = self.next;
        while self.next < notes.len() && notes[self.next].time < position_ms {
            self.next += 1;
        }
        self.prev = self.next;
        self.next - first
    }

    /// Advance `next` to the window edge and return the newly opened index
    /// range `[prev, next)`. Pure cursor logic; nothing is materialized.
    pub fn scan(&mut self, chart: &Chart) -> Range<usize> {
        let horizon = self.horizon_ms(chart);
        let notes = &chart.notes;
        while self.next < notes.len() && notes[self.next].time <= horizon {
            self.next += 1;
        }
        let opened = self.prev..self.next;
        self.prev = self.next;
        opened
    }

    /// One generator tick: open the next bar and materialize every note in it.
    /// Returns the number of notes materialized.
    pub fn tick(
        &mut self,
        chart: &Chart,
        audio_ms: TimeMs,
        pools: &mut NotePools,
        registry: &mut ActiveRegistry,
        scene: &mut dyn Scene,
    ) -> usize {
        self.advance_bars(1);
        self.materialize(chart, audio_ms, pools, registry, scene)
    }

    /// Scan the current window and materialize what it opened, without moving
    /// the bar counter.
    pub fn materialize(
        &mut self,
        chart: &Chart,
        audio_ms: TimeMs,
        pools: &mut NotePools,
        registry: &mut ActiveRegistry,
        scene: &mut dyn Scene,
    ) -> usize {
        let opened = self.scan(chart);
        let count = opened.len();

        for note in &chart.notes[opened] {
            let mut slot = pools.checkout(note.kind, scene);
            slot.place(*note, self.lane_x(note.lane), audio_ms, self.scale, scene);
            slot.activate(scene);
            slot.arm();
            trace!("materialized {} into slot {}", note, slot.id().0);
            registry.push(slot);
        }

        if count > 0 {
            debug!(
                "bar {}: materialized {} notes (cursor {}/{}, audio {:.0}ms)",
                self.current_bar,
                count,
                self.next,
                chart.notes.len(),
                audio_ms
            );
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visual::HeadlessScene;

    fn chart(notes: Vec<Note>) -> Chart {
        Chart::new("t", 1000.0, notes)
    }

    fn generator_at(initial_bar: u32) -> Generator {
        Generator::new(initial_bar, 0.01, DEFAULT_LANE_POSITIONS.to_vec())
    }

    #[test]
    fn test_scan_window_is_inclusive_at_horizon() {
        let c = chart(vec![
            Note::short(0.0, 0),
            Note::short(1000.0, 1),
            Note::short(1000.5, 2),
        ]);
        let mut g = generator_at(1);
        assert_eq!(g.scan(&c), 0..2, "note exactly on the horizon is included");
        assert_eq!(g.cursor(), (2, 2));
        assert_eq!(g.scan(&c), 2..2, "same window twice opens nothing");
    }

    #[test]
    fn test_scan_catches_up_over_many_bars() {
        let notes: Vec<Note> = (0..10).map(|i| Note::short(i as f64 * 500.0, i % 4)).collect();
        let c = chart(notes);
        let mut g = generator_at(0);
        assert_eq!(g.scan(&c), 0..1);
        g.advance_bars(3);
        assert_eq!(g.scan(&c), 1..7);
        g.advance_bars(100);
        assert_eq!(g.scan(&c), 7..10);
        assert!(g.is_exhausted(&c));
        g.advance_bars(1);
        assert_eq!(g.scan(&c), 10..10, "exhausted chart is a no-op");
    }

    #[test]
    fn test_empty_chart_is_exhausted() {
        let c = chart(vec![]);
        let mut g = generator_at(3);
        assert!(g.is_exhausted(&c));
        assert_eq!(g.scan(&c), 0..0);
    }

    #[test]
    fn test_tick_advances_bar_before_scanning() {
        let c = chart(vec![Note::short(3500.0, 0)]);
        let mut g = generator_at(3);
        let mut scene = HeadlessScene::new();
        let mut pools = NotePools::default();
        let mut reg = ActiveRegistry::new();

        assert_eq!(g.tick(&c, 0.0, &mut pools, &mut reg, &mut scene), 1);
        assert_eq!(g.current_bar(), 4);
        assert_eq!(g.horizon_ms(&c), 4000.0);
    }

    #[test]
    fn test_materialize_activates_arms_and_registers() {
        let c = chart(vec![Note::short(500.0, 1), Note::long(800.0, 1200.0, 3)]);
        let mut g = generator_at(1);
        let mut scene = HeadlessScene::new();
        let mut pools = NotePools::default();
        let mut reg = ActiveRegistry::new();

        let n = g.materialize(&c, 100.0, &mut pools, &mut reg, &mut scene);
        assert_eq!(n, 2);
        assert_eq!(reg.len(), 2);
        for slot in reg.iter() {
            assert!(slot.is_alive());
            assert!(slot.is_armed());
            assert!(scene.visual(slot.visual()).unwrap().active);
        }
        let long = reg.iter().find(|s| s.kind() == NoteKind::Long).unwrap();
        assert_eq!(long.positions()[0].x, 1.5);
        assert!((long.positions()[0].y - 7.0).abs() < 1e-4);
        assert!((long.positions()[1].y - 11.0).abs() < 1e-4);
    }

    #[test]
    fn test_seek_start_skips_played_notes_and_bars() {
        let notes: Vec<Note> = (0..60).map(|i| Note::short(i as f64 * 1000.0, i % 4)).collect();
        let c = chart(notes);
        let mut g = generator_at(3);
        let mut scene = HeadlessScene::new();
        let mut pools = NotePools::default();
        let mut reg = ActiveRegistry::new();

        assert_eq!(g.seek_start(&c, 30_000.0), 30);
        assert_eq!(g.current_bar(), 33);
        assert_eq!(g.cursor(), (30, 30));

        // First tick opens up to bar 34: notes at 30000..=34000
        assert_eq!(g.tick(&c, 30_000.0, &mut pools, &mut reg, &mut scene), 5);
        let first = reg.iter().next().unwrap();
        assert_eq!(first.note().map(|n| n.time), Some(30_000.0));
    }

    #[test]
    fn test_seek_start_mid_bar_rounds_up() {
        let c = chart(vec![Note::short(2400.0, 0), Note::short(2600.0, 1)]);
        let mut g = generator_at(3);
        assert_eq!(g.seek_start(&c, 2500.0), 1);
        assert_eq!(g.current_bar(), 6);
        assert_eq!(g.seek_start(&c, 0.0), 0, "zero position is a no-op");
    }

    #[test]
    #[should_panic]
    fn test_unvalidated_lane_panics() {
        let c = chart(vec![Note::short(0.0, 9)]);
        let mut g = generator_at(1);
        let mut scene = HeadlessScene::new();
        let mut pools = NotePools::default();
        let mut reg = ActiveRegistry::new();
        g.materialize(&c, 0.0, &mut pools, &mut reg, &mut scene);
    }
}
