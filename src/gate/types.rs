use crate::oracle::QualityScore;
use crate::providers::{Artifact, ProviderTier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One try within a gate cycle. Immutable once recorded.
#[derive(Debug, Clone)]
pub struct GenerationAttempt {
    /// 1-based position in the cycle; the optional fallback call comes last.
    pub index: u32,
    /// Candidate produced; absent when the provider call itself failed.
    pub artifact: Option<Artifact>,
    pub score: QualityScore,
    pub passed: bool,
    pub tier: ProviderTier,
    pub at: DateTime<Utc>,
}

/// Terminal status of a gate cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    /// An attempt cleared the pass threshold.
    Passed,
    /// Budget exhausted; the best candidate cleared the acceptable floor.
    AcceptedBelowThreshold,
    /// The one-shot fallback provider produced a usable artifact.
    FallbackUsed,
    /// Nothing usable. Publication must not proceed.
    Failed,
}

impl GateStatus {
    /// Whether the surrounding workflow may publish the artifact.
    pub const fn publishable(self) -> bool {
        !matches!(self, Self::Failed)
    }
}

/// Outcome of one full controller invocation. Created once per cycle and
/// never mutated after return; the attempt history lives only here.
#[derive(Debug, Clone)]
pub struct GateCycleResult {
    /// Accepted artifact; `None` on total failure.
    pub artifact: Option<Artifact>,
    /// Score of the accepted artifact; `None` on total failure.
    pub score: Option<QualityScore>,
    pub status: GateStatus,
    /// Ordered attempt history, fallback last if it ran.
    pub attempts: Vec<GenerationAttempt>,
}

impl GateCycleResult {
    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }

    pub fn publishable(&self) -> bool {
        self.status.publishable()
    }

    /// Highest score observed across the cycle, failed attempts included.
    pub fn best_score(&self) -> Option<f64> {
        self.attempts
            .iter()
            .map(|attempt| attempt.score.value)
            .fold(None, |best, value| match best {
                Some(current) if current >= value => Some(current),
                _ => Some(value),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_is_not_publishable() {
        assert!(!GateStatus::Failed.publishable());
        assert!(GateStatus::Passed.publishable());
        assert!(GateStatus::AcceptedBelowThreshold.publishable());
        assert!(GateStatus::FallbackUsed.publishable());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&GateStatus::AcceptedBelowThreshold).unwrap();
        assert_eq!(json, "\"accepted_below_threshold\"");
    }

    #[test]
    fn best_score_over_empty_history_is_none() {
        let result = GateCycleResult {
            artifact: None,
            score: None,
            status: GateStatus::Failed,
            attempts: vec![],
        };
        assert!(result.best_score().is_none());
    }
}
