use super::types::{Artifact, GenerationRequest};
use async_trait::async_trait;

/// A generation backend producing candidate artifacts from prompts.
///
/// Implementations must be safe to call repeatedly with the same request:
/// the gate loop retries without any dedup on the provider side. Errors
/// surface as `Err` and are absorbed by the gate as failed attempts rather
/// than crashing the cycle. Any timeout is the caller's concern; providers
/// themselves impose only their HTTP client timeouts.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Provider identifier (e.g. "openai", "anthropic").
    fn name(&self) -> &str;

    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<Artifact>;
}
