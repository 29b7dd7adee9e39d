mod controller;
mod escalation;
mod types;

pub use controller::{GateConfig, QualityGate};
pub use escalation::EscalationPolicy;
pub use types::{GateCycleResult, GateStatus, GenerationAttempt};
