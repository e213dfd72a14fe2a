use notefall::chart::Chart;
use notefall::clock::{AudioClock, SessionClock, WallClock};
use notefall::config::FieldConfig;
use notefall::console_display::ConsoleDisplay;
use notefall::demo::{demo_chart, DEMO_NAMES};
use notefall::error::FieldError;
use notefall::field::NoteField;
use notefall::runtime::PlaySession;
use notefall::scheduler::{Scheduler, TaskPlan};
use notefall::types::*;
use notefall::visual::HeadlessScene;

use clap::Parser;
use crossbeam_channel::{bounded, Sender, TrySendError};
use log::{error, info, trace, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "notefall")]
#[command(about = "Look-ahead note field player for rhythm-game charts")]
struct Cli {
    /// Chart file (JSON). Overrides --demo.
    #[arg(long)]
    chart: Option<PathBuf>,

    /// Built-in chart when no --chart is given: "basic", "stream" or "holds"
    #[arg(long, default_value = "basic")]
    demo: String,

    /// Field config file (JSON). Missing fields take defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scroll scale (scene units per ms), overrides the config
    #[arg(long)]
    scale: Option<f32>,

    /// Interpolation interval (ms), overrides the config
    #[arg(long)]
    interpolate_ms: Option<f64>,

    /// Run each periodic task on its own thread instead of one cooperative loop
    #[arg(long)]
    threaded: bool,

    /// Enable console display (terminal lane view)
    #[arg(long)]
    console: bool,

    /// Console display refresh rate (Hz)
    #[arg(long, default_value_t = 20)]
    display_hz: u32,

    /// Playback position to start from (ms)
    #[arg(long, default_value_t = 0.0)]
    start_ms: f64,

    /// Stop after this many seconds even if the chart has not finished
    #[arg(long)]
    duration_s: Option<f64>,
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), FieldError> {
    // ─── Config & chart ─────────────────────────────────────────────
    let mut config = match &cli.config {
        Some(path) => FieldConfig::load(path)?,
        None => FieldConfig::default(),
    };
    if let Some(scale) = cli.scale {
        config.scroll_scale = scale;
    }
    if let Some(ms) = cli.interpolate_ms {
        config.interpolate_ms = ms;
    }
    config.validate()?;

    let chart = match &cli.chart {
        Some(path) => Chart::load(path)?,
        None => demo_chart(&cli.demo).ok_or_else(|| {
            FieldError::InvalidConfig(format!(
                "unknown demo {:?}, expected one of {:?}",
                cli.demo, DEMO_NAMES
            ))
        })?,
    };

    info!("═══════════════════════════════════════════════");
    info!("  NOTEFALL v{}", env!("CARGO_PKG_VERSION"));
    info!("  Chart: {} ({} notes, {:.1}s)", chart.title, chart.notes.len(), chart.length_ms() / 1000.0);
    info!("  Mode: {}", if cli.threaded { "THREADED" } else { "COOPERATIVE" });
    if cli.console { info!("  UI: Console TUI"); }
    info!("═══════════════════════════════════════════════");

    let plan = TaskPlan::for_chart(&config, &chart)?;
    let field = NoteField::new(chart, &config, HeadlessScene::new())?.starting_at(cli.start_ms);
    let clock = Arc::new(WallClock::new(cli.start_ms));
    let deadline = cli
        .duration_s
        .filter(|s| s.is_finite() && *s > 0.0)
        .map(|s| Instant::now() + Duration::from_secs_f64(s));

    // ─── Console display (opt-in) ───────────────────────────────────
    let mut frame_txs: Vec<Sender<FieldFrame>> = Vec::new();
    let mut display: Option<JoinHandle<()>> = None;
    if cli.console {
        let (tx, rx) = bounded::<FieldFrame>(256);
        frame_txs.push(tx);
        let hz = cli.display_hz;
        let lanes = config.lane_count();
        display = Some(thread::Builder::new().name("display".into()).spawn(move || {
            ConsoleDisplay::new(rx, hz).with_lanes(lanes).run();
        })?);
    }

    // ─── Play ───────────────────────────────────────────────────────
    let field = if cli.threaded {
        play_threaded(field, plan, clock, frame_txs, deadline)?
    } else {
        Some(play_cooperative(field, plan, clock.as_ref(), frame_txs, deadline))
    };

    if let Some(handle) = display {
        let _ = handle.join();
    }
    match field {
        Some(field) => field.log_summary(),
        None => warn!("Note field lost; no session summary"),
    }
    Ok(())
}

fn done(finished: bool, deadline: Option<Instant>) -> bool {
    if finished {
        info!("Chart finished");
        return true;
    }
    if deadline.map_or(false, |d| Instant::now() >= d) {
        info!("Duration elapsed, stopping");
        return true;
    }
    false
}

/// All tasks on this thread, stepped at the simulation rate.
fn play_cooperative(
    mut field: NoteField<HeadlessScene>,
    plan: TaskPlan,
    clock: &dyn AudioClock,
    frame_txs: Vec<Sender<FieldFrame>>,
    deadline: Option<Instant>,
) -> NoteField<HeadlessScene> {
    let mut scheduler = Scheduler::new(plan);
    let wall = SessionClock::new();
    let mut last = wall.now_ms();
    let mut elapsed = Duration::ZERO;

    loop {
        let report = scheduler.step(elapsed, &mut field, clock);
        if report.moved && !frame_txs.is_empty() {
            let frame = field.snapshot();
            for tx in &frame_txs {
                if let Err(TrySendError::Full(_)) = tx.try_send(frame.clone()) {
                    trace!("display busy, frame dropped");
                }
            }
        }
        if done(field.is_finished(), deadline) {
            scheduler.stop();
            break;
        }

        thread::sleep(plan.simulate);
        let now = wall.now_ms();
        elapsed = Duration::from_secs_f64((now - last).max(0.0) / 1000.0);
        last = now;
    }
    field
}

/// One worker thread per task; this thread only watches for the end.
fn play_threaded(
    field: NoteField<HeadlessScene>,
    plan: TaskPlan,
    clock: Arc<WallClock>,
    frame_txs: Vec<Sender<FieldFrame>>,
    deadline: Option<Instant>,
) -> Result<Option<NoteField<HeadlessScene>>, FieldError> {
    let session = PlaySession::start(field, plan, clock, frame_txs)?;
    info!("Running threaded. Press Ctrl+C to stop.");
    while !done(session.is_finished(), deadline) {
        thread::sleep(Duration::from_millis(50));
    }
    Ok(session.stop())
}
