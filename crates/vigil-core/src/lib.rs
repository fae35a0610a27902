pub mod accumulator;
pub mod classifier;
pub mod config;
pub mod monitor;
pub mod persister;
pub mod tracker;

pub use accumulator::UsageAccumulator;
pub use config::TrackerConfig;
pub use monitor::{create_sampler, WindowSampler};
pub use tracker::{Tracker, TrackerState};
