use serde::{Deserialize, Serialize};

/// A candidate artifact produced by a generation provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    /// Article body or headline text.
    Text(String),
    /// Raw image bytes with their MIME type.
    Image { data: Vec<u8>, mime: String },
}

impl Artifact {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Image { .. } => None,
        }
    }

    pub const fn is_image(&self) -> bool {
        matches!(self, Self::Image { .. })
    }
}

/// Image payload attached to a request (vision-scoring calls).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub data: Vec<u8>,
    pub mime: String,
}

/// One generation request handed to a provider.
///
/// Safe to submit repeatedly: the gate loop retries the same request without
/// deduplication on the provider side.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub image: Option<ImageAttachment>,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            model: model.into(),
            temperature: 0.7,
            image: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_image(mut self, data: Vec<u8>, mime: impl Into<String>) -> Self {
        self.image = Some(ImageAttachment {
            data,
            mime: mime.into(),
        });
        self
    }
}

/// Which provider tier produced an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderTier {
    Primary,
    Fallback,
}

impl std::fmt::Display for ProviderTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}
