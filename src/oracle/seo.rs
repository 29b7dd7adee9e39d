//! LLM-judge SEO scoring for article text.

use super::coercion::extract_json_object;
use super::score::{QualityScore, ScoreContext};
use super::traits::ScoringOracle;
use crate::providers::{Artifact, GenerationProvider, GenerationRequest};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You are an SEO editor scoring article drafts. \
Respond with a single JSON object and nothing else.";

pub struct SeoOracle {
    judge: Arc<dyn GenerationProvider>,
    model: String,
}

/// Strict shape of the judge response. Unknown fields reject the parse so a
/// drifting judge prompt degrades loudly to the fallback score instead of
/// feeding half-parsed structures downstream.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeoVerdict {
    overall: f64,
    #[serde(default)]
    clarity: Option<f64>,
    #[serde(default)]
    keyword_usage: Option<f64>,
    #[serde(default)]
    structure: Option<f64>,
    #[serde(default)]
    length: Option<f64>,
}

impl SeoOracle {
    pub fn new(judge: Arc<dyn GenerationProvider>, model: impl Into<String>) -> Self {
        Self {
            judge,
            model: model.into(),
        }
    }

    fn build_prompt(text: &str, context: &ScoreContext) -> String {
        let mut prompt = String::from(
            "Score the article below on a 0-100 scale for search performance.\n\
             Rate clarity, keyword usage, structure, and length; `overall` is \
             the aggregate.\n\
             Reply with exactly this JSON shape:\n\
             {\"overall\": <0-100>, \"clarity\": <0-100>, \"keyword_usage\": <0-100>, \
             \"structure\": <0-100>, \"length\": <0-100>}\n",
        );

        if let Some(keyword) = &context.focus_keyword {
            let _ = writeln!(prompt, "Focus keyword: {keyword}");
        }
        if let Some(brief) = &context.brief {
            let _ = writeln!(prompt, "Brief: {brief}");
        }

        let _ = write!(prompt, "\nArticle:\n{text}");
        prompt
    }

    fn parse_verdict(raw: &str) -> Option<SeoVerdict> {
        let json = extract_json_object(raw)?;
        serde_json::from_str(json).ok()
    }

    fn verdict_to_score(verdict: SeoVerdict) -> QualityScore {
        let mut breakdown = BTreeMap::new();
        for (key, value) in [
            ("clarity", verdict.clarity),
            ("keyword_usage", verdict.keyword_usage),
            ("structure", verdict.structure),
            ("length", verdict.length),
        ] {
            if let Some(value) = value {
                breakdown.insert(key.to_string(), value);
            }
        }
        QualityScore::with_breakdown(verdict.overall, breakdown).clamped(0.0, 100.0)
    }
}

#[async_trait]
impl ScoringOracle for SeoOracle {
    fn name(&self) -> &str {
        "seo"
    }

    async fn score(&self, artifact: &Artifact, context: &ScoreContext) -> QualityScore {
        let Some(text) = artifact.as_text() else {
            tracing::warn!(oracle = self.name(), "Non-text artifact, using fallback score");
            return self.fallback_score();
        };

        let request = GenerationRequest::text(Self::build_prompt(text, context), &self.model)
            .with_system(SYSTEM_PROMPT)
            .with_temperature(0.0);

        let raw = match self.judge.generate(&request).await {
            Ok(Artifact::Text(raw)) => raw,
            Ok(Artifact::Image { .. }) => {
                tracing::warn!(oracle = self.name(), "Judge returned an image, using fallback score");
                return self.fallback_score();
            }
            Err(e) => {
                tracing::warn!(oracle = self.name(), "Judge call failed, using fallback score: {e:#}");
                return self.fallback_score();
            }
        };

        match Self::parse_verdict(&raw) {
            Some(verdict) => Self::verdict_to_score(verdict),
            None => {
                tracing::warn!(
                    oracle = self.name(),
                    "Unparseable judge response, using fallback score"
                );
                self.fallback_score()
            }
        }
    }
}
