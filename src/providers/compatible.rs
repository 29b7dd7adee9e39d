//! Generic OpenAI-compatible chat provider.
//!
//! The primary and fallback generation tiers are both instances of this
//! provider pointed at different base URLs / models; most hosted LLM APIs
//! speak the same `/chat/completions` format. Vision-scoring requests attach
//! the image as a base64 `image_url` content part.

use super::http::{api_error, build_provider_client};
use super::traits::GenerationProvider;
use super::types::{Artifact, GenerationRequest};
use anyhow::Context;
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub struct OpenAiCompatibleProvider {
    name: String,
    base_url: String,
    /// Pre-computed `"Bearer <key>"` header value (avoids `format!` per request).
    cached_auth_header: Option<String>,
    /// Pre-computed chat completions URL.
    cached_chat_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiCompatibleProvider {
    pub fn new(name: &str, base_url: &str, api_key: Option<&str>) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let cached_chat_url = if base_url.contains("chat/completions") {
            base_url.clone()
        } else {
            format!("{base_url}/chat/completions")
        };

        Self {
            name: name.to_string(),
            base_url,
            cached_auth_header: api_key.map(|k| format!("Bearer {k}")),
            cached_chat_url,
            client: build_provider_client(),
        }
    }

    /// Configured base URL (diagnostics).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request(request: &GenerationRequest) -> ChatRequest {
        let capacity = if request.system.is_some() { 2 } else { 1 };
        let mut messages = Vec::with_capacity(capacity);

        if let Some(system) = &request.system {
            messages.push(Message {
                role: "system",
                content: MessageContent::Text(system.clone()),
            });
        }

        let content = if let Some(image) = &request.image {
            let encoded = BASE64.encode(&image.data);
            MessageContent::Parts(vec![
                ContentPart::Text {
                    text: request.prompt.clone(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: format!("data:{};base64,{encoded}", image.mime),
                    },
                },
            ])
        } else {
            MessageContent::Text(request.prompt.clone())
        };

        messages.push(Message {
            role: "user",
            content,
        });

        ChatRequest {
            model: request.model.clone(),
            messages,
            temperature: request.temperature,
        }
    }

    fn extract_text(&self, response: &ChatResponse) -> anyhow::Result<String> {
        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("No response from {}", self.name))
    }

    async fn call_chat_completions(&self, request: &ChatRequest) -> anyhow::Result<ChatResponse> {
        let auth_header = self.cached_auth_header.as_ref().ok_or_else(|| {
            anyhow::anyhow!("{} API key not set; configure providers.*.api_key_env", self.name)
        })?;

        let response = self
            .client
            .post(&self.cached_chat_url)
            .header("Authorization", auth_header)
            .json(request)
            .send()
            .await
            .with_context(|| format!("{} request failed", self.name))?;

        if !response.status().is_success() {
            return Err(api_error(&self.name, response).await);
        }

        response
            .json()
            .await
            .with_context(|| format!("{} response JSON decode failed", self.name))
    }
}

#[async_trait]
impl GenerationProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<Artifact> {
        let chat_request = Self::build_request(request);
        let chat_response = self.call_chat_completions(&chat_request).await?;
        let text = self.extract_text(&chat_response)?;
        Ok(Artifact::Text(text))
    }
}
