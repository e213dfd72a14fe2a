use crate::types::*;
use crossbeam_channel::Receiver;
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Rows in the lane view, top row furthest from the judgement line.
const ROWS: usize = 20;
/// Scene units covered by one row.
const ROW_UNITS: f32 = 1.0;

/// Renders a live ASCII view of the note field and the pool counters.
pub struct ConsoleDisplay {
    rx: Receiver<FieldFrame>,
    update_hz: u32,
    lanes: usize,
}

impl ConsoleDisplay {
    pub fn new(rx: Receiver<FieldFrame>, update_hz: u32) -> Self {
        Self {
            rx,
            update_hz,
            lanes: DEFAULT_LANE_POSITIONS.len(),
        }
    }

    pub fn with_lanes(mut self, lanes: usize) -> Self {
        self.lanes = lanes.max(1);
        self
    }

    /// Render frames until every sender is dropped. Frames arriving faster
    /// than `update_hz` are skipped.
    pub fn run(&self) {
        let period = if self.update_hz == 0 {
            Duration::from_millis(50)
        } else {
            Duration::from_secs(1) / self.update_hz
        };
        let mut last: Option<Instant> = None;
        let mut stdout = io::stdout();

        for frame in self.rx.iter() {
            if last.map_or(false, |t| t.elapsed() < period) {
                continue;
            }
            last = Some(Instant::now());

            // Clear screen and move cursor home
            print!("\x1b[2J\x1b[H");
            print!("{}", render_frame(&frame, self.lanes));
            let _ = stdout.flush();
        }
    }
}

/// Draw one frame: lane columns with note glyphs above the judgement line,
/// then the playback position and the pool counters.
pub fn render_frame(frame: &FieldFrame, lanes: usize) -> String {
    let mut grid = vec![vec![' '; lanes]; ROWS];

    for slot in &frame.slots {
        if slot.lane >= lanes {
            continue;
        }
        let head = match slot.positions.first() {
            Some(p) => p.y,
            None => continue,
        };
        let glyph = if slot.alive { '●' } else { '×' };
        if let Some(tail) = slot.positions.get(1).map(|p| p.y) {
            for row in row_span(head, tail) {
                grid[row][slot.lane] = '┃';
            }
        }
        if let Some(row) = row_of(head) {
            grid[row][slot.lane] = glyph;
        }
    }

    let mut out = String::new();
    out.push_str(&format!("╔{}╗\n", "═".repeat(lanes * 4 + 1)));
    for row in grid.iter().rev() {
        out.push_str("║ ");
        for &c in row {
            out.push_str(&format!(" {}  ", c));
        }
        out.push_str("║\n");
    }
    out.push_str(&format!("╠{}╣\n", "═".repeat(lanes * 4 + 1)));

    let secs = frame.audio_ms / 1000.0;
    out.push_str(&format!(
        "  Time: {:.2}s   Bar: {}   Notes: {}/{}\n",
        secs, frame.bar, frame.cursor, frame.total_notes
    ));
    let p = &frame.pools;
    out.push_str(&format!(
        "  Short pool: {} {}/{}\n",
        make_bar(p.short_idle, p.short_total, 24),
        p.short_idle,
        p.short_total
    ));
    out.push_str(&format!(
        "  Long pool:  {} {}/{}\n",
        make_bar(p.long_idle, p.long_total, 24),
        p.long_idle,
        p.long_total
    ));
    out.push_str(&format!("  Active: {}\n", p.active));
    out
}

fn row_of(y: f32) -> Option<usize> {
    if y < 0.0 {
        return None;
    }
    let row = (y / ROW_UNITS) as usize;
    (row < ROWS).then_some(row)
}

/// Rows covered by a hold body, clipped to the view.
fn row_span(head: f32, tail: f32) -> std::ops::Range<usize> {
    if tail < 0.0 {
        return 0..0;
    }
    let lo = (head.max(0.0) / ROW_UNITS) as usize;
    let hi = ((tail.max(0.0) / ROW_UNITS) as usize + 1).min(ROWS);
    lo.min(hi)..hi
}

fn make_bar(filled: usize, total: usize, width: usize) -> String {
    let frac = if total == 0 { 0.0 } else { filled as f32 / total as f32 };
    let n = (frac * width as f32).round() as usize;
    let empty = width.saturating_sub(n);
    format!("[{}{}]", "█".repeat(n), "░".repeat(empty))
}
