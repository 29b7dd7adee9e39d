use crate::providers::GenerationProvider;
use std::sync::Arc;

/// Escalation decision inputs for a gate cycle.
///
/// This is configuration, not state: it holds no mutable fields and one
/// instance can be shared across any number of concurrent cycles.
///
/// The acceptable floor doubles as the hard cutoff — no automated path
/// publishes an artifact scoring below it. When `accept_below_threshold`
/// is off, a cycle that misses the pass threshold skips straight to the
/// fallback provider instead of force-accepting its best candidate.
#[derive(Clone)]
pub struct EscalationPolicy {
    fallback: Option<Arc<dyn GenerationProvider>>,
    acceptable_floor: f64,
    accept_below_threshold: bool,
}

impl EscalationPolicy {
    pub fn new(acceptable_floor: f64) -> Self {
        Self {
            fallback: None,
            acceptable_floor,
            accept_below_threshold: true,
        }
    }

    pub fn with_fallback(mut self, provider: Arc<dyn GenerationProvider>) -> Self {
        self.fallback = Some(provider);
        self
    }

    pub fn with_accept_below_threshold(mut self, allowed: bool) -> Self {
        self.accept_below_threshold = allowed;
        self
    }

    pub fn acceptable_floor(&self) -> f64 {
        self.acceptable_floor
    }

    pub fn fallback(&self) -> Option<&Arc<dyn GenerationProvider>> {
        self.fallback.as_ref()
    }

    /// Whether a below-threshold best candidate may be force-accepted.
    pub fn permits_below_threshold(&self, score: f64) -> bool {
        self.accept_below_threshold && score >= self.acceptable_floor
    }

    /// Whether a fallback result is usable at all.
    pub fn clears_floor(&self, score: f64) -> bool {
        score >= self.acceptable_floor
    }
}

impl std::fmt::Debug for EscalationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscalationPolicy")
            .field("fallback", &self.fallback.as_ref().map(|p| p.name().to_string()))
            .field("acceptable_floor", &self.acceptable_floor)
            .field("accept_below_threshold", &self.accept_below_threshold)
            .finish()
    }
}
