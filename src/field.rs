use crate::chart::Chart;
use crate::config::FieldConfig;
use crate::error::FieldError;
use crate::generator::Generator;
use crate::interpolator;
use crate::liveness::{JudgementLine, LivenessRule};
use crate::pool::NotePools;
use crate::registry::ActiveRegistry;
use crate::sweeper;
use crate::types::*;
use crate::visual::Scene;
use log::{debug, info, trace};

/// One play session's note state: chart, generator cursors, both pools, the
/// active registry, the scene, and the liveness rule.
///
/// Every periodic task mutates the session through `&mut NoteField`, so
/// whoever holds it exclusively (the cooperative scheduler, or the mutex in
/// [`crate::runtime::PlaySession`]) is the one serialization point for the
/// registry and both pools.
pub struct NoteField<S: Scene> {
    chart: Chart,
    generator: Generator,
    pools: NotePools,
    registry: ActiveRegistry,
    scene: S,
    rule: Box<dyn LivenessRule>,
    scale: f32,
    last_audio_ms: TimeMs,
    /// Totals for the session summary
    materialized: usize,
    reclaimed: usize,
}

impl<S: Scene> NoteField<S> {
    /// Validate the config and chart and build an idle session. Nothing is
    /// materialized until the first generator tick.
    pub fn new(chart: Chart, config: &FieldConfig, scene: S) -> Result<Self, FieldError> {
        config.validate()?;
        chart.validate(config.lane_count())?;

        info!(
            "Note field: {:?}, {} notes ({} long), bar {:.1}ms, scale {}",
            chart.title,
            chart.notes.len(),
            chart.count(NoteKind::Long),
            chart.bar_duration_ms,
            config.scroll_scale
        );

        Ok(Self {
            generator: Generator::new(
                config.initial_bar,
                config.scroll_scale,
                config.lane_positions.clone(),
            ),
            pools: NotePools::new(config.short_pool_capacity, config.long_pool_capacity),
            registry: ActiveRegistry::with_capacity(config.short_pool_capacity),
            scene,
            rule: Box::new(JudgementLine {
                late_window_ms: config.late_window_ms,
            }),
            scale: config.scroll_scale,
            last_audio_ms: 0.0,
            materialized: 0,
            reclaimed: 0,
            chart,
        })
    }

    /// Start the session at `position_ms` of the chart instead of 0. Call
    /// before the first tick.
    pub fn starting_at(mut self, position_ms: TimeMs) -> Self {
        let skipped = self.generator.seek_start(&self.chart, position_ms);
        self.last_audio_ms = position_ms.max(0.0);
        if position_ms > 0.0 {
            info!(
                "Starting at {:.0}ms (bar {}), {} earlier notes skipped",
                position_ms,
                self.generator.current_bar(),
                skipped
            );
        }
        self
    }

    /// Replace the liveness rule.
    pub fn with_rule(mut self, rule: impl LivenessRule + 'static) -> Self {
        self.rule = Box::new(rule);
        self
    }

    // ─── Periodic tasks ─────────────────────────────────────────────────

    /// Generator tick: open the next bar and materialize its notes.
    pub fn generate(&mut self, audio_ms: TimeMs) -> usize {
        self.last_audio_ms = audio_ms;
        let n = self.generator.tick(
            &self.chart,
            audio_ms,
            &mut self.pools,
            &mut self.registry,
            &mut self.scene,
        );
        self.materialized += n;
        n
    }

    /// Catch up several bars in one tick (e.g. after a stall or a forward seek).
    pub fn generate_bars(&mut self, bars: u32, audio_ms: TimeMs) -> usize {
        if bars == 0 {
            return 0;
        }
        self.generator.advance_bars(bars - 1);
        self.generate(audio_ms)
    }

    /// Interpolation tick: refresh every registered slot's position.
    pub fn interpolate(&mut self, audio_ms: TimeMs) -> usize {
        self.last_audio_ms = audio_ms;
        interpolator::interpolate(&mut self.registry, &mut self.scene, audio_ms, self.scale)
    }

    /// Simulation tick: let armed slots run their liveness rule.
    /// Returns the number that died this tick.
    pub fn simulate(&mut self, audio_ms: TimeMs) -> usize {
        self.last_audio_ms = audio_ms;
        let rule = &*self.rule;
        let died = self
            .registry
            .iter_mut()
            .map(|slot| slot.update(audio_ms, rule))
            .filter(|&died| died)
            .count();
        if died > 0 {
            trace!("simulate: {} notes expired at {:.0}ms", died, audio_ms);
        }
        died
    }

    /// Release tick: reclaim dead slots into their pools.
    pub fn release(&mut self) -> usize {
        let n = sweeper::sweep(&mut self.registry, &mut self.pools, &mut self.scene);
        self.reclaimed += n;
        n
    }

    /// Mark the oldest live note in `lane` dead, as a hit would. Returns
    /// whether a note was found.
    pub fn resolve_lane(&mut self, lane: usize) -> bool {
        match self
            .registry
            .iter_mut()
            .find(|s| s.is_alive() && s.note().map(|n| n.lane) == Some(lane))
        {
            Some(slot) => {
                slot.kill();
                true
            }
            None => false,
        }
    }

    // ─── Inspection ─────────────────────────────────────────────────────

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    pub fn registry(&self) -> &ActiveRegistry {
        &self.registry
    }

    pub fn pools(&self) -> &NotePools {
        &self.pools
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pools.stats(self.registry.len())
    }

    pub fn materialized(&self) -> usize {
        self.materialized
    }

    pub fn reclaimed(&self) -> usize {
        self.reclaimed
    }

    /// Every chart note has been materialized and reclaimed.
    pub fn is_finished(&self) -> bool {
        self.generator.is_exhausted(&self.chart) && self.registry.is_empty()
    }

    pub fn snapshot(&self) -> FieldFrame {
        FieldFrame {
            audio_ms: self.last_audio_ms,
            bar: self.generator.current_bar(),
            cursor: self.generator.cursor().1,
            total_notes: self.chart.notes.len(),
            slots: self.registry.iter().filter_map(|s| s.view()).collect(),
            pools: self.pool_stats(),
        }
    }

    pub fn log_summary(&self) {
        let stats = self.pool_stats();
        info!(
            "Session: {} materialized, {} reclaimed, pools short {}/{} long {}/{}",
            self.materialized,
            self.reclaimed,
            stats.short_idle,
            stats.short_total,
            stats.long_idle,
            stats.long_total
        );
        debug!("Final frame: {}", self.snapshot());
    }
}
