//! Note-field tuning: scroll speed, lane layout, task intervals, pool sizes.
//!
//! Every field is optional in the JSON form; missing fields take the defaults
//! below, so `{}` is a valid config file.

use crate::error::FieldError;
use crate::types::*;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FieldConfig {
    /// Scene units per millisecond of time-to-go. The single scroll-speed knob.
    pub scroll_scale: f32,
    /// Lane x-coordinates, index = lane number
    pub lane_positions: Vec<f32>,
    /// Bar counter before the first generator tick
    pub initial_bar: u32,
    /// Interpolation tick period (ms)
    pub interpolate_ms: f64,
    /// Release period as a fraction of the bar duration
    pub release_ratio: f64,
    /// Simulation (liveness) tick period (ms)
    pub simulate_ms: f64,
    pub short_pool_capacity: usize,
    pub long_pool_capacity: usize,
    /// How long a note stays alive after its end time has passed the line (ms)
    pub late_window_ms: f64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            scroll_scale: DEFAULT_SCROLL_SCALE,
            lane_positions: DEFAULT_LANE_POSITIONS.to_vec(),
            initial_bar: DEFAULT_INITIAL_BAR,
            interpolate_ms: 250.0,
            release_ratio: 0.5,
            simulate_ms: 16.0,
            short_pool_capacity: DEFAULT_SHORT_POOL_CAPACITY,
            long_pool_capacity: DEFAULT_LONG_POOL_CAPACITY,
            late_window_ms: 200.0,
        }
    }
}

impl FieldConfig {
    /// Load from a JSON file and validate.
    pub fn load(path: &Path) -> Result<Self, FieldError> {
        let data = std::fs::read_to_string(path)?;
        let config = Self::from_json(&data)?;
        info!("Loaded field config from {:?}", path);
        Ok(config)
    }

    pub fn from_json(data: &str) -> Result<Self, FieldError> {
        let config: FieldConfig = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn lane_count(&self) -> usize {
        self.lane_positions.len()
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        if !(self.scroll_scale.is_finite() && self.scroll_scale > 0.0) {
            return Err(FieldError::InvalidConfig(format!(
                "scroll_scale must be positive, got {}",
                self.scroll_scale
            )));
        }
        if self.lane_positions.is_empty() {
            return Err(FieldError::InvalidConfig("lane_positions is empty".into()));
        }
        check_interval("interpolate", self.interpolate_ms)?;
        check_interval("simulate", self.simulate_ms)?;
        if !(self.release_ratio > 0.0 && self.release_ratio <= 1.0) {
            return Err(FieldError::InvalidConfig(format!(
                "release_ratio must be in (0, 1], got {}",
                self.release_ratio
            )));
        }
        if !(self.late_window_ms.is_finite() && self.late_window_ms >= 0.0) {
            return Err(FieldError::InvalidConfig(format!(
                "late_window_ms must be non-negative, got {}",
                self.late_window_ms
            )));
        }
        Ok(())
    }
}

pub(crate) fn check_interval(name: &'static str, ms: f64) -> Result<(), FieldError> {
    if ms.is_finite() && ms > 0.0 {
        Ok(())
    } else {
        Err(FieldError::InvalidInterval { name, ms })
    }
}
