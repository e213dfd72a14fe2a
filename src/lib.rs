pub mod chart;
pub mod clock;
pub mod config;
pub mod console_display;
pub mod demo;
pub mod error;
pub mod field;
pub mod generator;
pub mod interpolator;
pub mod liveness;
pub mod pool;
pub mod registry;
pub mod runtime;
pub mod scheduler;
pub mod slot;
pub mod sweeper;
pub mod types;
pub mod visual;
