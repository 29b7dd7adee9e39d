use super::compatible::OpenAiCompatibleProvider;
use super::traits::GenerationProvider;
use crate::config::ProviderSettings;
use std::sync::Arc;

/// Build a chat generation provider from config, resolving the API key from
/// the configured environment variable.
pub fn chat_provider(name: &str, settings: &ProviderSettings) -> Arc<dyn GenerationProvider> {
    let api_key = settings.api_key();
    if api_key.is_none() {
        tracing::warn!(
            provider = name,
            env = settings.api_key_env.as_str(),
            "API key not set; generation calls will fail"
        );
    }
    Arc::new(OpenAiCompatibleProvider::new(
        name,
        &settings.base_url,
        api_key.as_deref(),
    ))
}
