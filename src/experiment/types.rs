use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One candidate version (e.g. of a title) competing in an experiment.
///
/// Counters only move forward, and only through record-impression /
/// record-click. Clicks may exceed impressions: the delivery pipeline does
/// not guarantee impression tracking is perfectly ordered, and recording is
/// deliberately lenient about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: String,
    pub content: String,
    pub impressions: u64,
    pub clicks: u64,
}

impl Variant {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            impressions: 0,
            clicks: 0,
        }
    }

    pub fn with_id(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            impressions: 0,
            clicks: 0,
        }
    }

    /// Click-through rate; 0 when the variant has no impressions yet.
    #[allow(clippy::cast_precision_loss)]
    pub fn ctr(&self) -> f64 {
        if self.impressions == 0 {
            0.0
        } else {
            self.clicks as f64 / self.impressions as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStatus {
    Running,
    Completed,
    Paused,
}

impl std::fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Paused => "paused",
        };
        f.write_str(label)
    }
}

impl std::str::FromStr for ExperimentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "paused" => Ok(Self::Paused),
            other => Err(format!("unknown experiment status: {other}")),
        }
    }
}

/// A headline experiment for one subject (e.g. one article).
///
/// `Completed` is terminal: the winner, once set, never changes, and later
/// winner-checks are no-ops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub subject: String,
    /// Id of the original/control variant; always present in `variants`.
    pub control_id: String,
    /// All variants, control first.
    pub variants: Vec<Variant>,
    pub status: ExperimentStatus,
    pub winner_id: Option<String>,
    pub confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Experiment {
    pub fn new(subject: impl Into<String>, control: Variant, alternatives: Vec<Variant>) -> Self {
        let control_id = control.id.clone();
        let mut variants = Vec::with_capacity(alternatives.len() + 1);
        variants.push(control);
        variants.extend(alternatives);

        Self {
            subject: subject.into(),
            control_id,
            variants,
            status: ExperimentStatus::Running,
            winner_id: None,
            confidence: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == ExperimentStatus::Running
    }

    pub fn variant(&self, id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == id)
    }

    pub fn variant_mut(&mut self, id: &str) -> Option<&mut Variant> {
        self.variants.iter_mut().find(|v| v.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctr_is_zero_without_impressions() {
        let variant = Variant::new("Ten compost tips");
        assert!(variant.ctr().abs() < f64::EPSILON);
    }

    #[test]
    fn ctr_is_clicks_over_impressions() {
        let mut variant = Variant::new("Ten compost tips");
        variant.impressions = 200;
        variant.clicks = 30;
        assert!((variant.ctr() - 0.15).abs() < 1e-12);
    }

    #[test]
    fn new_experiment_starts_running_with_control_first() {
        let control = Variant::with_id("control", "Original title");
        let experiment = Experiment::new(
            "article-1",
            control,
            vec![Variant::with_id("alt-1", "Alternative title")],
        );
        assert_eq!(experiment.status, ExperimentStatus::Running);
        assert_eq!(experiment.variants[0].id, "control");
        assert_eq!(experiment.control_id, "control");
        assert!(experiment.winner_id.is_none());
        assert!(experiment.variants.iter().all(|v| v.impressions == 0 && v.clicks == 0));
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            ExperimentStatus::Running,
            ExperimentStatus::Completed,
            ExperimentStatus::Paused,
        ] {
            let parsed: ExperimentStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("archived".parse::<ExperimentStatus>().is_err());
    }
}
