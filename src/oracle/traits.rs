use super::score::{QualityScore, ScoreContext};
use crate::providers::Artifact;
use async_trait::async_trait;

/// Assigns a numeric quality score to a candidate artifact.
///
/// Oracles may themselves be AI-backed: identical inputs are NOT guaranteed
/// identical scores, so callers must treat scores as noisy signals rather
/// than exact measurements.
///
/// Scoring never fails. When the underlying call errors or its response
/// cannot be parsed, implementations return [`ScoringOracle::fallback_score`]
/// — a conservative mid-range value, never the maximum — so the gate always
/// has a comparable value to retain as best-seen.
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    /// Oracle identifier (e.g. "seo", "vision").
    fn name(&self) -> &str;

    /// Inclusive score range this oracle produces.
    fn range(&self) -> (f64, f64) {
        (0.0, 100.0)
    }

    /// Conservative substitute used when the scoring call degrades.
    fn fallback_score(&self) -> QualityScore {
        let (min, max) = self.range();
        QualityScore::new(min + (max - min) / 2.0)
    }

    async fn score(&self, artifact: &Artifact, context: &ScoreContext) -> QualityScore;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedOracle;

    #[async_trait]
    impl ScoringOracle for FixedOracle {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn score(&self, _artifact: &Artifact, _context: &ScoreContext) -> QualityScore {
            QualityScore::new(42.0)
        }
    }

    #[test]
    fn default_fallback_is_mid_range() {
        let oracle = FixedOracle;
        let fallback = oracle.fallback_score();
        assert!((fallback.value - 50.0).abs() < f64::EPSILON);
        let (_, max) = oracle.range();
        assert!(fallback.value < max);
    }
}
