//! Cooperative driver for the periodic note-field tasks.
//!
//! Each task accumulates monotonic elapsed time and fires once per full
//! interval. All tasks run on the caller's thread, one at a time, each to
//! completion, so the note field needs no locking. Within one step tasks
//! fire in [`Task::ALL`] order.

use crate::chart::Chart;
use crate::clock::AudioClock;
use crate::config::{check_interval, FieldConfig};
use crate::error::FieldError;
use crate::field::NoteField;
use crate::visual::Scene;
use log::{info, trace, warn};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// Open the next bar and materialize its notes (once per bar)
    Generate,
    /// Refresh positions from the audio clock (many times per bar)
    Interpolate,
    /// Run each slot's liveness rule (frame rate)
    Simulate,
    /// Reclaim dead slots (twice per bar)
    Release,
}

impl Task {
    pub const ALL: [Task; 4] = [Task::Generate, Task::Interpolate, Task::Simulate, Task::Release];

    /// Generation and interpolation run at session start; release and
    /// simulation first run one interval in.
    pub fn fires_immediately(self) -> bool {
        matches!(self, Task::Generate | Task::Interpolate)
    }

    pub fn name(self) -> &'static str {
        match self {
            Task::Generate => "generator",
            Task::Interpolate => "interpolator",
            Task::Simulate => "simulate",
            Task::Release => "release",
        }
    }
}

/// Interval of each task for one chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskPlan {
    pub generate: Duration,
    pub interpolate: Duration,
    pub simulate: Duration,
    pub release: Duration,
}

impl TaskPlan {
    /// Generation runs once per bar and release every `release_ratio` bar.
    /// Interpolation must be strictly faster than release; a slower setting
    /// is clamped to half the release interval.
    pub fn for_chart(config: &FieldConfig, chart: &Chart) -> Result<Self, FieldError> {
        config.validate()?;
        if !(chart.bar_duration_ms.is_finite() && chart.bar_duration_ms > 0.0) {
            return Err(FieldError::InvalidBarDuration(chart.bar_duration_ms));
        }

        let bar_ms = chart.bar_duration_ms;
        let release_ms = bar_ms * config.release_ratio;
        check_interval("release", release_ms)?;

        let mut interpolate_ms = config.interpolate_ms;
        if interpolate_ms >= release_ms {
            let clamped = release_ms / 2.0;
            warn!(
                "interpolate interval {:.1}ms is not faster than release {:.1}ms; using {:.1}ms",
                interpolate_ms, release_ms, clamped
            );
            interpolate_ms = clamped;
        }

        Ok(Self {
            generate: ms(bar_ms),
            interpolate: ms(interpolate_ms),
            simulate: ms(config.simulate_ms),
            release: ms(release_ms),
        })
    }

    pub fn interval(&self, task: Task) -> Duration {
        match task {
            Task::Generate => self.generate,
            Task::Interpolate => self.interpolate,
            Task::Simulate => self.simulate,
            Task::Release => self.release,
        }
    }
}

fn ms(v: f64) -> Duration {
    Duration::from_micros((v * 1000.0).round() as u64).max(Duration::from_micros(1))
}

/// Elapsed-time accumulator for one task.
#[derive(Debug, Clone)]
pub struct PeriodicTask {
    pub task: Task,
    interval: Duration,
    accumulated: Duration,
    pending_first: bool,
}

impl PeriodicTask {
    pub fn new(task: Task, interval: Duration) -> Self {
        Self {
            task,
            interval,
            accumulated: Duration::ZERO,
            pending_first: task.fires_immediately(),
        }
    }

    /// Add `elapsed` and return how many times the task is due.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        let mut due = 0;
        if self.pending_first {
            self.pending_first = false;
            due += 1;
        }
        self.accumulated += elapsed;
        while self.accumulated >= self.interval {
            self.accumulated -= self.interval;
            due += 1;
        }
        due
    }
}

/// What one scheduler step did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub generated: usize,
    pub interpolated: usize,
    pub died: usize,
    pub reclaimed: usize,
    /// True if any interpolation ran this step
    pub moved: bool,
}

pub struct Scheduler {
    tasks: Vec<PeriodicTask>,
    stopped: bool,
}

impl Scheduler {
    pub fn new(plan: TaskPlan) -> Self {
        info!(
            "Scheduler: generate {:?}, interpolate {:?}, simulate {:?}, release {:?}",
            plan.generate, plan.interpolate, plan.simulate, plan.release
        );
        Self {
            tasks: Task::ALL
                .iter()
                .map(|&t| PeriodicTask::new(t, plan.interval(t)))
                .collect(),
            stopped: false,
        }
    }

    /// Stop issuing ticks. Later steps are no-ops.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Feed `elapsed` wall time and run every task that came due. The audio
    /// clock is polled once per firing.
    pub fn step<S: Scene>(
        &mut self,
        elapsed: Duration,
        field: &mut NoteField<S>,
        clock: &dyn AudioClock,
    ) -> StepReport {
        let mut report = StepReport::default();
        if self.stopped {
            return report;
        }

        for periodic in &mut self.tasks {
            let due = periodic.advance(elapsed);
            for _ in 0..due {
                let now = clock.now_ms();
                match periodic.task {
                    Task::Generate => report.generated += field.generate(now),
                    Task::Interpolate => {
                        report.interpolated += field.interpolate(now);
                        report.moved = true;
                    }
                    Task::Simulate => report.died += field.simulate(now),
                    Task::Release => report.reclaimed += field.release(),
                }
            }
            if due > 1 {
                trace!("{} ran {} times in one step", periodic.task.name(), due);
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::types::Note;
    use crate::visual::HeadlessScene;

    fn chart() -> Chart {
        Chart::new(
            "scenario",
            2000.0,
            vec![Note::short(500.0, 1), Note::long(1800.0, 3200.0, 2)],
        )
    }

    #[test]
    fn test_plan_from_bar_duration() {
        let plan = TaskPlan::for_chart(&FieldConfig::default(), &chart()).unwrap();
        assert_eq!(plan.generate, Duration::from_millis(2000));
        assert_eq!(plan.release, Duration::from_millis(1000));
        assert_eq!(plan.interpolate, Duration::from_millis(250));
        assert_eq!(plan.simulate, Duration::from_millis(16));
    }

    #[test]
    fn test_plan_clamps_slow_interpolation() {
        let c = Chart::new("fast", 400.0, vec![]);
        let plan = TaskPlan::for_chart(&FieldConfig::default(), &c).unwrap();
        assert_eq!(plan.release, Duration::from_millis(200));
        assert_eq!(plan.interpolate, Duration::from_millis(100));
        assert!(plan.interpolate < plan.release);
    }

    #[test]
    fn test_plan_rejects_zero_bar() {
        let c = Chart::new("zero", 0.0, vec![]);
        assert_eq!(
            TaskPlan::for_chart(&FieldConfig::default(), &c),
            Err(FieldError::InvalidBarDuration(0.0))
        );
    }

    #[test]
    fn test_periodic_first_fire_shapes() {
        let mut generate = PeriodicTask::new(Task::Generate, Duration::from_millis(100));
        let mut rel = PeriodicTask::new(Task::Release, Duration::from_millis(100));
        assert_eq!(generate.advance(Duration::ZERO), 1, "generator fires at start");
        assert_eq!(rel.advance(Duration::ZERO), 0, "release waits one interval");
        assert_eq!(generate.advance(Duration::from_millis(99)), 0);
        assert_eq!(generate.advance(Duration::from_millis(1)), 1);
        assert_eq!(rel.advance(Duration::from_millis(100)), 1);
    }

    #[test]
    fn test_periodic_catch_up_counts_every_interval() {
        let mut t = PeriodicTask::new(Task::Simulate, Duration::from_millis(10));
        assert_eq!(t.advance(Duration::from_millis(35)), 3);
        assert_eq!(t.advance(Duration::from_millis(5)), 1, "remainder carried over");
    }

    #[test]
    fn test_step_runs_tasks_in_order() {
        let clock = ManualClock::new(0.0);
        let mut field =
            NoteField::new(chart(), &FieldConfig::default(), HeadlessScene::new()).unwrap();
        let plan = TaskPlan::for_chart(&FieldConfig::default(), field.chart()).unwrap();
        let mut sched = Scheduler::new(plan);

        let r = sched.step(Duration::ZERO, &mut field, &clock);
        assert_eq!(r.generated, 2);
        assert_eq!(r.interpolated, 2, "interpolation sees notes generated this step");
        assert_eq!(r.reclaimed, 0);
        assert!(r.moved);
    }

    #[test]
    fn test_stopped_scheduler_is_inert() {
        let clock = ManualClock::new(0.0);
        let mut field =
            NoteField::new(chart(), &FieldConfig::default(), HeadlessScene::new()).unwrap();
        let plan = TaskPlan::for_chart(&FieldConfig::default(), field.chart()).unwrap();
        let mut sched = Scheduler::new(plan);
        sched.stop();
        assert_eq!(sched.step(Duration::from_secs(10), &mut field, &clock), StepReport::default());
        assert_eq!(field.materialized(), 0);
        assert!(sched.is_stopped());
    }
}
