use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate quality score with an optional diagnostic breakdown.
///
/// Only `value` participates in gate control flow; the breakdown exists for
/// logs and review tooling. The range is fixed per oracle (both shipped
/// oracles use 0–100).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub value: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub breakdown: BTreeMap<String, f64>,
}

impl QualityScore {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            breakdown: BTreeMap::new(),
        }
    }

    pub fn with_breakdown(value: f64, breakdown: BTreeMap<String, f64>) -> Self {
        Self { value, breakdown }
    }

    /// Clamp the aggregate into the oracle's documented range.
    pub fn clamped(mut self, min: f64, max: f64) -> Self {
        self.value = self.value.clamp(min, max);
        self
    }
}

/// Target context handed to scoring oracles for rubric construction.
#[derive(Debug, Clone, Default)]
pub struct ScoreContext {
    /// Subject the artifact belongs to (article id, campaign id).
    pub subject: Option<String>,
    /// Focus keyword the article should rank for.
    pub focus_keyword: Option<String>,
    /// Free-form brief describing the desired outcome.
    pub brief: Option<String>,
}

impl ScoreContext {
    pub fn for_subject(subject: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            ..Self::default()
        }
    }

    pub fn with_focus_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.focus_keyword = Some(keyword.into());
        self
    }

    pub fn with_brief(mut self, brief: impl Into<String>) -> Self {
        self.brief = Some(brief.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_into_range() {
        assert!((QualityScore::new(140.0).clamped(0.0, 100.0).value - 100.0).abs() < f64::EPSILON);
        assert!(QualityScore::new(-3.0).clamped(0.0, 100.0).value.abs() < f64::EPSILON);
        assert!((QualityScore::new(55.5).clamped(0.0, 100.0).value - 55.5).abs() < f64::EPSILON);
    }

    #[test]
    fn breakdown_serializes_only_when_present() {
        let bare = serde_json::to_string(&QualityScore::new(50.0)).unwrap();
        assert!(!bare.contains("breakdown"));

        let mut breakdown = BTreeMap::new();
        breakdown.insert("clarity".to_string(), 70.0);
        let full = serde_json::to_string(&QualityScore::with_breakdown(65.0, breakdown)).unwrap();
        assert!(full.contains("clarity"));
    }

    #[test]
    fn context_builder_chains() {
        let context = ScoreContext::for_subject("article-7")
            .with_focus_keyword("rainwater harvesting")
            .with_brief("how-to guide");
        assert_eq!(context.subject.as_deref(), Some("article-7"));
        assert_eq!(context.focus_keyword.as_deref(), Some("rainwater harvesting"));
    }
}
