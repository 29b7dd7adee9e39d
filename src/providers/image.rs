//! Images-endpoint client for hero-image generation.
//!
//! Speaks the OpenAI `/images/generations` format with `b64_json` responses
//! so the artifact bytes come back inline rather than via a signed URL.

use super::http::{api_error, build_provider_client};
use super::traits::GenerationProvider;
use super::types::{Artifact, GenerationRequest};
use anyhow::Context;
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub struct ImageGenerationProvider {
    name: String,
    cached_auth_header: Option<String>,
    cached_images_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ImagesRequest {
    model: String,
    prompt: String,
    n: u8,
    response_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    data: Vec<ImagePayload>,
}

#[derive(Debug, Deserialize)]
struct ImagePayload {
    b64_json: Option<String>,
}

impl ImageGenerationProvider {
    pub fn new(name: &str, base_url: &str, api_key: Option<&str>) -> Self {
        let base_url = base_url.trim_end_matches('/');
        let cached_images_url = if base_url.contains("images/generations") {
            base_url.to_string()
        } else {
            format!("{base_url}/images/generations")
        };

        Self {
            name: name.to_string(),
            cached_auth_header: api_key.map(|k| format!("Bearer {k}")),
            cached_images_url,
            client: build_provider_client(),
        }
    }

    fn decode_payload(&self, response: ImagesResponse) -> anyhow::Result<Vec<u8>> {
        let payload = response
            .data
            .into_iter()
            .next()
            .and_then(|image| image.b64_json)
            .ok_or_else(|| anyhow::anyhow!("No image payload from {}", self.name))?;
        BASE64
            .decode(payload.as_bytes())
            .with_context(|| format!("{} returned invalid base64 image data", self.name))
    }
}

#[async_trait]
impl GenerationProvider for ImageGenerationProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<Artifact> {
        let auth_header = self.cached_auth_header.as_ref().ok_or_else(|| {
            anyhow::anyhow!("{} API key not set; configure providers.*.api_key_env", self.name)
        })?;

        let body = ImagesRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            n: 1,
            response_format: "b64_json",
        };

        let response = self
            .client
            .post(&self.cached_images_url)
            .header("Authorization", auth_header)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("{} image request failed", self.name))?;

        if !response.status().is_success() {
            return Err(api_error(&self.name, response).await);
        }

        let images: ImagesResponse = response
            .json()
            .await
            .with_context(|| format!("{} image response JSON decode failed", self.name))?;

        let data = self.decode_payload(images)?;
        Ok(Artifact::Image {
            data,
            mime: "image/png".to_string(),
        })
    }
}
