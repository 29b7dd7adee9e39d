//! Vision-judge quality scoring for hero images.

use super::coercion::extract_json_object;
use super::score::{QualityScore, ScoreContext};
use super::traits::ScoringOracle;
use crate::providers::{Artifact, GenerationProvider, GenerationRequest};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You are an art director scoring candidate hero images. \
Respond with a single JSON object and nothing else.";

pub struct VisionOracle {
    judge: Arc<dyn GenerationProvider>,
    model: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VisionVerdict {
    overall: f64,
    #[serde(default)]
    composition: Option<f64>,
    #[serde(default)]
    relevance: Option<f64>,
    /// Freedom from generation defects (warped text, extra limbs, seams).
    #[serde(default)]
    cleanliness: Option<f64>,
}

impl VisionOracle {
    pub fn new(judge: Arc<dyn GenerationProvider>, model: impl Into<String>) -> Self {
        Self {
            judge,
            model: model.into(),
        }
    }

    fn build_prompt(context: &ScoreContext) -> String {
        let mut prompt = String::from(
            "Score the attached image on a 0-100 scale as a blog hero image.\n\
             Rate composition, relevance to the brief, and cleanliness \
             (absence of generation defects); `overall` is the aggregate.\n\
             Reply with exactly this JSON shape:\n\
             {\"overall\": <0-100>, \"composition\": <0-100>, \"relevance\": <0-100>, \
             \"cleanliness\": <0-100>}\n",
        );

        if let Some(brief) = &context.brief {
            let _ = writeln!(prompt, "Brief: {brief}");
        }
        prompt
    }

    fn parse_verdict(raw: &str) -> Option<VisionVerdict> {
        let json = extract_json_object(raw)?;
        serde_json::from_str(json).ok()
    }

    fn verdict_to_score(verdict: VisionVerdict) -> QualityScore {
        let mut breakdown = BTreeMap::new();
        for (key, value) in [
            ("composition", verdict.composition),
            ("relevance", verdict.relevance),
            ("cleanliness", verdict.cleanliness),
        ] {
            if let Some(value) = value {
                breakdown.insert(key.to_string(), value);
            }
        }
        QualityScore::with_breakdown(verdict.overall, breakdown).clamped(0.0, 100.0)
    }
}

#[async_trait]
impl ScoringOracle for VisionOracle {
    fn name(&self) -> &str {
        "vision"
    }

    async fn score(&self, artifact: &Artifact, context: &ScoreContext) -> QualityScore {
        let Artifact::Image { data, mime } = artifact else {
            tracing::warn!(oracle = self.name(), "Non-image artifact, using fallback score");
            return self.fallback_score();
        };

        let request = GenerationRequest::text(Self::build_prompt(context), &self.model)
            .with_system(SYSTEM_PROMPT)
            .with_temperature(0.0)
            .with_image(data.clone(), mime.clone());

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
