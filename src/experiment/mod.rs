mod significance;
mod store;
mod tracker;
mod types;

pub use significance::significance;
pub use store::{ExperimentStore, SqliteExperimentStore};
pub use tracker::{ExperimentConfig, ExperimentTracker};
pub use types::{Experiment, ExperimentStatus, Variant};
