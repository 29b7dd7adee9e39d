use super::escalation::EscalationPolicy;
use super::types::{GateCycleResult, GateStatus, GenerationAttempt};
use crate::config::GateSettings;
use crate::oracle::{QualityScore, ScoreContext, ScoringOracle};
use crate::providers::{GenerationProvider, GenerationRequest, ProviderTier};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// Knobs for one gate controller. The inter-attempt delay is an explicit
/// parameter; zero fires attempts back-to-back.
#[derive(Debug, Clone)]
pub struct GateConfig {
    pub pass_threshold: f64,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            pass_threshold: 70.0,
            max_attempts: 3,
            retry_delay: Duration::ZERO,
        }
    }
}

impl From<&GateSettings> for GateConfig {
    fn from(settings: &GateSettings) -> Self {
        Self {
            pass_threshold: settings.pass_threshold,
            max_attempts: settings.max_attempts.max(1),
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
        }
    }
}

/// Bounded-retry generation controller.
///
/// Holds no state across invocations: each [`QualityGate::run`] call is
/// self-contained and independent cycles may run concurrently. The loop is
/// deliberately sequential within a cycle — every attempt is a paid
/// generation call and the policy stops at the first pass.
pub struct QualityGate {
    config: GateConfig,
    policy: EscalationPolicy,
}

impl QualityGate {
    pub fn new(config: GateConfig, policy: EscalationPolicy) -> Self {
        Self { config, policy }
    }

    /// Wire a gate from config, with an optional fallback provider.
    pub fn from_settings(
        settings: &GateSettings,
        fallback: Option<Arc<dyn GenerationProvider>>,
    ) -> Self {
        let mut policy = EscalationPolicy::new(settings.acceptable_floor)
            .with_accept_below_threshold(settings.accept_below_threshold);
        if let Some(provider) = fallback {
            policy = policy.with_fallback(provider);
        }
        Self::new(GateConfig::from(settings), policy)
    }

    /// Run one gate cycle: generate, score, retry within budget, then apply
    /// the escalation policy.
    pub async fn run(
        &self,
        provider: &dyn GenerationProvider,
        oracle: &dyn ScoringOracle,
        request: &GenerationRequest,
        context: &ScoreContext,
    ) -> GateCycleResult {
        let mut attempts: Vec<GenerationAttempt> =
            Vec::with_capacity(self.config.max_attempts as usize);
        // Index into `attempts` of the best candidate so far. Only attempts
        // that produced an artifact qualify.
        let mut best: Option<usize> = None;

        for index in 1..=self.config.max_attempts {
            if index > 1 && !self.config.retry_delay.is_zero() {
                tokio::time::sleep(self.config.retry_delay).await;
            }

            let attempt = self
                .attempt(provider, oracle, request, context, index, ProviderTier::Primary)
                .await;

            tracing::debug!(
                attempt = index,
                score = attempt.score.value,
                passed = attempt.passed,
                "Gate attempt scored"
            );

            let passed = attempt.passed;
            let has_artifact = attempt.artifact.is_some();
            let score_value = attempt.score.value;
            attempts.push(attempt);
            let slot = attempts.len() - 1;

            if passed {
                let accepted = &attempts[slot];
                return GateCycleResult {
                    artifact: accepted.artifact.clone(),
                    score: Some(accepted.score.clone()),
                    status: GateStatus::Passed,
                    attempts,
                };
            }

            // Strict >: first-seen wins on equal score, preferring the
            // earlier (cheaper) attempt.
            if has_artifact && best.is_none_or(|b| score_value > attempts[b].score.value) {
                best = Some(slot);
            }
        }

        if let Some(slot) = best {
            let score_value = attempts[slot].score.value;
            if self.policy.permits_below_threshold(score_value) {
                tracing::info!(
                    score = score_value,
                    threshold = self.config.pass_threshold,
                    "Accepting best candidate below threshold"
                );
                let accepted = &attempts[slot];
                return GateCycleResult {
                    artifact: accepted.artifact.clone(),
                    score: Some(accepted.score.clone()),
                    status: GateStatus::AcceptedBelowThreshold,
                    attempts,
                };
            }
        }

        if let Some(fallback) = self.policy.fallback() {
            tracing::warn!(
                provider = fallback.name(),
                "Retry budget exhausted, escalating to fallback provider"
            );
            let attempt = self
                .attempt(
                    fallback.as_ref(),
                    oracle,
                    request,
                    context,
                    self.config.max_attempts + 1,
                    ProviderTier::Fallback,
                )
                .await;

            let usable = attempt.artifact.is_some()
                && (attempt.passed || self.policy.clears_floor(attempt.score.value));
            attempts.push(attempt);
            let slot = attempts.len() - 1;

            if usable {
                let accepted = &attempts[slot];
                return GateCycleResult {
                    artifact: accepted.artifact.clone(),
                    score: Some(accepted.score.clone()),
                    status: GateStatus::FallbackUsed,
                    attempts,
                };
            }
        }

        tracing::warn!(
            attempts = attempts.len(),
            floor = self.policy.acceptable_floor(),
            "Gate cycle failed; nothing cleared the floor"
        );
        GateCycleResult {
            artifact: None,
            score: None,
            status: GateStatus::Failed,
            attempts,
        }
    }

    async fn attempt(
        &self,
        provider: &dyn GenerationProvider,
        oracle: &dyn ScoringOracle,
        request: &GenerationRequest,
        context: &ScoreContext,
        index: u32,
        tier: ProviderTier,
    ) -> GenerationAttempt {
        match provider.generate(request).await {
            Ok(artifact) => {
                let score = oracle.score(&artifact, context).await;
                let passed = score.value >= self.config.pass_threshold;
                GenerationAttempt {
                    index,
                    artifact: Some(artifact),
                    score,
                    passed,
                    tier,
                    at: Utc::now(),
                }
            }
            Err(e) => {
                tracing::warn!(
                    provider = provider.name(),
                    attempt = index,
                    tier = %tier,
                    "Generation failed, recording attempt with minimum score: {e:#}"
                );
                let (range_min, _) = oracle.range();
                GenerationAttempt {
                    index,
                    artifact: None,
                    score: QualityScore::new(range_min),
                    passed: false,
                    tier,
                    at: Utc::now(),
                }
            }
        }
    }
}
