use crate::clock::AudioClock;
use crate::error::FieldError;
use crate::field::NoteField;
use crate::scheduler::{Task, TaskPlan};
use crate::types::FieldFrame;
use crate::visual::Scene;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use log::{debug, error, info, trace, warn};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Threaded play session: one named worker per periodic task.
///
/// The note field sits behind a single mutex, so ticks from different
/// workers never overlap. Workers sleep on a shared stop channel; dropping
/// the sender (via [`PlaySession::stop`], or by dropping the session) wakes
/// them all and each exits after its current tick.
///
/// After every interpolation tick the interpolator worker publishes a
/// [`FieldFrame`] to each consumer. Slow consumers miss frames rather than
/// stall the worker.
pub struct PlaySession<S: Scene + 'static> {
    field: Arc<Mutex<NoteField<S>>>,
    stop_tx: Sender<()>,
    handles: Vec<JoinHandle<()>>,
}

impl<S: Scene + 'static> PlaySession<S> {
    /// Run the start-of-session ticks on the calling thread, in task order,
    /// then spawn the workers.
    pub fn start(
        field: NoteField<S>,
        plan: TaskPlan,
        clock: Arc<dyn AudioClock>,
        frame_txs: Vec<Sender<FieldFrame>>,
    ) -> Result<Self, FieldError> {
        let field = Arc::new(Mutex::new(field));
        let (stop_tx, stop_rx) = bounded::<()>(0);

        let worker = Worker {
            field: Arc::clone(&field),
            clock,
            frame_txs: Arc::new(frame_txs),
        };
        for task in Task::ALL.iter().copied().filter(|t| t.fires_immediately()) {
            worker.run(task);
        }

        let start = Instant::now();
        let mut handles = Vec::with_capacity(Task::ALL.len());
        for task in Task::ALL {
            let worker = worker.clone();
            let stop_rx = stop_rx.clone();
            let interval = plan.interval(task);
            let handle = thread::Builder::new()
                .name(task.name().into())
                .spawn(move || worker.run_every(task, interval, start, stop_rx))?;
            handles.push(handle);
        }

        info!("Play session started with {} workers", handles.len());
        Ok(Self {
            field,
            stop_tx,
            handles,
        })
    }

    /// Run `f` against the field under the session lock. `None` if a worker
    /// panicked while holding it.
    pub fn with_field<R>(&self, f: impl FnOnce(&mut NoteField<S>) -> R) -> Option<R> {
        match self.field.lock() {
            Ok(mut field) => Some(f(&mut field)),
            Err(_) => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.with_field(|f| f.is_finished()).unwrap_or(true)
    }

    /// Stop every worker, wait for them, and hand back the field.
    pub fn stop(self) -> Option<NoteField<S>> {
        let Self {
            field,
            stop_tx,
            handles,
        } = self;
        drop(stop_tx);

        for handle in handles {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                error!("{} worker panicked", name);
            }
        }
        info!("Play session stopped");

        let mutex = match Arc::try_unwrap(field) {
            Ok(mutex) => mutex,
            Err(_) => {
                warn!("Note field still shared after stop");
                return None;
            }
        };
        match mutex.into_inner() {
            Ok(field) => Some(field),
            Err(poisoned) => {
                warn!("Recovering note field from a poisoned lock");
                Some(poisoned.into_inner())
            }
        }
    }
}

struct Worker<S: Scene + 'static> {
    field: Arc<Mutex<NoteField<S>>>,
    clock: Arc<dyn AudioClock>,
    frame_txs: Arc<Vec<Sender<FieldFrame>>>,
}

impl<S: Scene + 'static> Clone for Worker<S> {
    fn clone(&self) -> Self {
        Self {
            field: Arc::clone(&self.field),
            clock: Arc::clone(&self.clock),
            frame_txs: Arc::clone(&self.frame_txs),
        }
    }
}

impl<S: Scene + 'static> Worker<S> {
    /// Tick on a fixed grid of deadlines from `start`, so time spent in a
    /// tick or waiting for the lock does not push later ticks back. A worker
    /// that falls behind runs the missed ticks back to back.
    fn run_every(&self, task: Task, interval: Duration, start: Instant, stop_rx: Receiver<()>) {
        debug!("{} worker running every {:?}", task.name(), interval);
        let mut ticks: u64 = 0;
        let mut deadline = start + interval;
        loop {
            match stop_rx.recv_deadline(deadline) {
                Err(RecvTimeoutError::Timeout) => {
                    if !self.run(task) {
                        break;
                    }
                    ticks += 1;
                    deadline += interval;
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!("{} worker exiting after {} ticks", task.name(), ticks);
    }

    /// One tick of `task`. False if the session lock is poisoned.
    fn run(&self, task: Task) -> bool {
        let mut field = match self.field.lock() {
            Ok(field) => field,
            Err(_) => {
                error!("{}: note field lock poisoned, stopping", task.name());
                return false;
            }
        };
        let now = self.clock.now_ms();
        match task {
            Task::Generate => {
                field.generate(now);
            }
            Task::Interpolate => {
                field.interpolate(now);
                if !self.frame_txs.is_empty() {
                    let frame = field.snapshot();
                    drop(field);
                    self.publish(frame);
                }
            }
            Task::Simulate => {
                field.simulate(now);
            }
            Task::Release => {
                field.release();
            }
        }
        true
    }

    fn publish(&self, frame: FieldFrame) {
        for tx in self.frame_txs.iter() {
            match tx.try_send(frame.clone()) {
                Ok(()) | Err(TrySendError::Disconnected(_)) => {}
                Err(TrySendError::Full(_)) => {
                    trace!("frame consumer full, dropping frame");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Chart;
    use crate::clock::ManualClock;
    use crate::config::FieldConfig;
    use crate::types::Note;
    use crate::visual::HeadlessScene;

    fn fast_config() -> FieldConfig {
        FieldConfig {
            interpolate_ms: 5.0,
            simulate_ms: 2.0,
            ..Default::default()
        }
    }

    fn fast_chart() -> Chart {
        let notes = (0..12)
            .map(|i| {
                if i % 3 == 0 {
                    Note::long(i as f64 * 10.0, i as f64 * 10.0 + 25.0, i % 4)
                } else {
                    Note::short(i as f64 * 10.0, i % 4)
                }
            })
            .collect();
        Chart::new("fast", 40.0, notes)
    }

    fn start(
        clock: Arc<ManualClock>,
        frame_txs: Vec<Sender<FieldFrame>>,
    ) -> PlaySession<HeadlessScene> {
        let cfg = fast_config();
        let chart = fast_chart();
        let plan = TaskPlan::for_chart(&cfg, &chart).unwrap();
        let field = NoteField::new(chart, &cfg, HeadlessScene::new()).unwrap();
        PlaySession::start(field, plan, clock, frame_txs).unwrap()
    }

    #[test]
    fn test_start_generates_before_spawning() {
        let clock = Arc::new(ManualClock::new(0.0));
        let session = start(clock, vec![]);
        // Initial bar 3 → first tick opens bar 4, window 0..160ms
        let materialized = session.with_field(|f| f.materialized()).unwrap();
        assert_eq!(materialized, 12);
        session.stop().unwrap();
    }

    #[test]
    fn test_session_plays_to_completion() {
        let clock = Arc::new(ManualClock::new(0.0));
        let (tx, rx) = bounded::<FieldFrame>(64);
        let session = start(Arc::clone(&clock), vec![tx]);

        clock.set(10_000.0);
        let deadline = Instant::now() + Duration::from_secs(5);
        while !session.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        let field = session.stop().expect("field returned");
        assert!(field.is_finished());
        assert_eq!(field.reclaimed(), 12);
        assert_eq!(field.scene().active_count(), 0);
        assert!(rx.try_recv().is_ok(), "interpolator published frames");
    }

    #[test]
    fn test_stop_wakes_idle_workers() {
        let cfg = FieldConfig::default();
        let chart = Chart::new("slow", 60_000.0, vec![Note::short(0.0, 0)]);
        let plan = TaskPlan::for_chart(&cfg, &chart).unwrap();
        let field = NoteField::new(chart, &cfg, HeadlessScene::new()).unwrap();
        let session =
            PlaySession::start(field, plan, Arc::new(ManualClock::new(0.0)), vec![]).unwrap();

        let started = Instant::now();
        let field = session.stop().unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(field.materialized(), 1);
    }

    #[test]
    fn test_workers_catch_up_after_a_held_lock() {
        let cfg = FieldConfig::default();
        let chart = Chart::new("grid", 20.0, vec![Note::short(0.0, 0)]);
        let plan = TaskPlan::for_chart(&cfg, &chart).unwrap();
        let field = NoteField::new(chart, &cfg, HeadlessScene::new()).unwrap();
        let session =
            PlaySession::start(field, plan, Arc::new(ManualClock::new(0.0)), vec![]).unwrap();
        let started = Instant::now();

        session.with_field(|_| thread::sleep(Duration::from_millis(300)));
        thread::sleep(Duration::from_millis(60));

        let bar = session.with_field(|f| f.generator().current_bar()).unwrap();
        let elapsed_bars = (started.elapsed().as_millis() / 20) as u32;
        session.stop().unwrap();
        // Initial tick took bar 3 to 4; every 20ms since then is one more bar
        assert!(
            bar + 4 >= 4 + elapsed_bars,
            "bar {} after {} elapsed bars",
            bar,
            elapsed_bars
        );
    }

    #[test]
    fn test_dropped_consumer_does_not_stall() {
        let clock = Arc::new(ManualClock::new(0.0));
        let (tx, rx) = bounded::<FieldFrame>(1);
        drop(rx);
        let session = start(clock, vec![tx]);
        thread::sleep(Duration::from_millis(30));
        assert!(session.stop().is_some());
    }
}
