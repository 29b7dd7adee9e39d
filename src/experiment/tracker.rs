use super::significance::significance;
use super::store::ExperimentStore;
use super::types::{Experiment, ExperimentStatus, Variant};
use crate::config::ExperimentSettings;
use crate::error::{ExperimentError, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Winner-check thresholds.
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    /// Minimum impressions per variant before a winner-check may run.
    pub min_impressions: u64,
    /// Confidence a variant must reach to be declared the winner.
    pub confidence_bar: f64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            min_impressions: 100,
            confidence_bar: 0.95,
        }
    }
}

impl From<&ExperimentSettings> for ExperimentConfig {
    fn from(settings: &ExperimentSettings) -> Self {
        Self {
            min_impressions: settings.min_impressions,
            confidence_bar: settings.confidence_bar,
        }
    }
}

/// Tracks headline experiments: variant exposure, impression/click
/// observations, and winner declaration.
///
/// Per-subject mutations are serialized through a subject-keyed async lock so
/// concurrent recordings keep counts monotonic and winner-checks see a
/// consistent snapshot. Operations on different subjects do not coordinate.
pub struct ExperimentTracker {
    store: Arc<dyn ExperimentStore>,
    config: ExperimentConfig,
    subject_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ExperimentTracker {
    pub fn new(store: Arc<dyn ExperimentStore>, config: ExperimentConfig) -> Self {
        Self {
            store,
            config,
            subject_locks: Mutex::new(HashMap::new()),
        }
    }

    fn subject_lock(&self, subject: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .subject_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks.entry(subject.to_string()).or_default().clone()
    }

    /// Create an experiment for a subject with all counters at zero.
    pub async fn create_experiment(
        &self,
        subject: &str,
        control: Variant,
        alternatives: Vec<Variant>,
    ) -> Result<Experiment> {
        let lock = self.subject_lock(subject);
        let _guard = lock.lock().await;

        if self.store.load(subject).await?.is_some() {
            return Err(ExperimentError::DuplicateExperiment {
                subject: subject.to_string(),
            }
            .into());
        }

        let experiment = Experiment::new(subject, control, alternatives);
        self.store.insert(&experiment).await?;
        tracing::info!(
            subject,
            variants = experiment.variants.len(),
            "Experiment created"
        );
        Ok(experiment)
    }

    /// Variant to render for the next page view: the one with the fewest
    /// impressions, so exposure evens out over time. `None` when no running
    /// experiment exists for the subject.
    pub async fn select_variant_to_show(&self, subject: &str) -> Result<Option<Variant>> {
        let lock = self.subject_lock(subject);
        let _guard = lock.lock().await;

        let Some(experiment) = self.store.load(subject).await? else {
            return Ok(None);
        };
        if !experiment.is_running() {
            return Ok(None);
        }

        // min_by_key keeps the first minimum: ties go to stored order.
        Ok(experiment
            .variants
            .iter()
            .min_by_key(|v| v.impressions)
            .cloned())
    }

    pub async fn record_impression(&self, subject: &str, variant_id: &str) -> Result<()> {
        let lock = self.subject_lock(subject);
        let _guard = lock.lock().await;

        let mut experiment = self.load_or_unknown(subject).await?;
        let variant = Self::variant_or_unknown(&mut experiment, subject, variant_id)?;
        variant.impressions = variant.impressions.saturating_add(1);
        self.store.save(&experiment).await?;
        Ok(())
    }

    /// Record a click and run a winner-check. Returns the winning variant id
    /// when this click completed the experiment.
    ///
    /// A click with no prior impression is accepted: impression tracking is
    /// not perfectly ordered in the delivery pipeline, so clicks may
    /// transiently exceed impressions.
    pub async fn record_click(&self, subject: &str, variant_id: &str) -> Result<Option<String>> {
        let lock = self.subject_lock(subject);
        let _guard = lock.lock().await;

        let mut experiment = self.load_or_unknown(subject).await?;
        let variant = Self::variant_or_unknown(&mut experiment, subject, variant_id)?;
        variant.clicks = variant.clicks.saturating_add(1);

        let winner = self.check_winner(&mut experiment);
        self.store.save(&experiment).await?;
        Ok(winner)
    }

    /// Current experiment state for a subject.
    pub async fn experiment(&self, subject: &str) -> Result<Option<Experiment>> {
        Ok(self.store.load(subject).await?)
    }

    /// Pause a running experiment: variants stop being served and
    /// winner-checks stop, but in-flight observations still record.
    /// Completed experiments stay completed.
    pub async fn pause(&self, subject: &str) -> Result<()> {
        self.transition(subject, ExperimentStatus::Running, ExperimentStatus::Paused)
            .await
    }

    /// Resume a paused experiment.
    pub async fn resume(&self, subject: &str) -> Result<()> {
        self.transition(subject, ExperimentStatus::Paused, ExperimentStatus::Running)
            .await
    }

    async fn transition(
        &self,
        subject: &str,
        from: ExperimentStatus,
        to: ExperimentStatus,
    ) -> Result<()> {
        let lock = self.subject_lock(subject);
        let _guard = lock.lock().await;

        let mut experiment = self.load_or_unknown(subject).await?;
        if experiment.status == from {
            experiment.status = to;
            self.store.save(&experiment).await?;
        }
        Ok(())
    }

    async fn load_or_unknown(&self, subject: &str) -> Result<Experiment> {
        self.store.load(subject).await?.ok_or_else(|| {
            ExperimentError::UnknownExperiment {
                subject: subject.to_string(),
            }
            .into()
        })
    }

    fn variant_or_unknown<'a>(
        experiment: &'a mut Experiment,
        subject: &str,
        variant_id: &str,
    ) -> Result<&'a mut Variant> {
        experiment.variant_mut(variant_id).ok_or_else(|| {
            ExperimentError::UnknownVariant {
                subject: subject.to_string(),
                variant_id: variant_id.to_string(),
            }
            .into()
        })
    }

    /// One-way winner declaration. A completed (or paused) experiment is a
    /// no-op; the winner, once set, never changes.
    fn check_winner(&self, experiment: &mut Experiment) -> Option<String> {
        if experiment.status != ExperimentStatus::Running {
            return None;
        }

        let sampled = experiment
            .variants
            .iter()
            .filter(|v| v.impressions >= self.config.min_impressions)
            .count();
        if sampled < 2 {
            return None;
        }

        // Best by CTR; first in stored order wins ties.
        let mut best_index = 0;
        for (index, variant) in experiment.variants.iter().enumerate().skip(1) {
            if variant.ctr() > experiment.variants[best_index].ctr() {
                best_index = index;
            }
        }

        let best = &experiment.variants[best_index];
        let mut top_confidence: f64 = 0.0;
        for (index, variant) in experiment.variants.iter().enumerate() {
            if index == best_index {
                continue;
            }
            let confidence = significance(
                variant.clicks,
                variant.impressions,
                best.clicks,
                best.impressions,
            );
            top_confidence = top_confidence.max(confidence);
        }

        if top_confidence < self.config.confidence_bar {
            return None;
        }

        let winner_id = best.id.clone();
        experiment.status = ExperimentStatus::Completed;
        experiment.winner_id = Some(winner_id.clone());
        experiment.confidence = Some(top_confidence);
        experiment.completed_at = Some(Utc::now());
        tracing::info!(
            subject = experiment.subject.as_str(),
            winner = winner_id.as_str(),
            confidence = top_confidence,
            "Experiment completed"
        );
        Some(winner_id)
    }
}
