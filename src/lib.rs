#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod config;
pub mod error;
pub mod experiment;
pub mod gate;
pub mod oracle;
pub mod providers;

pub use config::Config;
pub use error::{PressgateError, Result};
pub use experiment::{ExperimentTracker, SqliteExperimentStore, significance};
pub use gate::{EscalationPolicy, GateConfig, GateCycleResult, GateStatus, QualityGate};
pub use oracle::{QualityScore, ScoreContext, ScoringOracle};
pub use providers::{Artifact, GenerationProvider, GenerationRequest};
