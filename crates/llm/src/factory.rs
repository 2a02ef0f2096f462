//! LLM provider factory.
//!
//! Builds a generation client from the `llm` configuration section,
//! resolving the endpoint and injecting the API key.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiClient};
use crate::types::ProviderType;
use dot_core::{AppError, AppResult, LlmSettings};
use std::sync::Arc;

/// Create an LLM client from configuration.
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required
/// API key is missing.
pub fn create_client(
    settings: &LlmSettings,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider = ProviderType::parse(&settings.provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", settings.provider)))?;

    let endpoint = settings
        .endpoint
        .as_deref()
        .unwrap_or_else(|| provider.default_endpoint());

    tracing::debug!(provider = provider.as_str(), endpoint, "Creating LLM client");

    match provider {
        ProviderType::Ollama => Ok(Arc::new(OllamaClient::with_base_url(endpoint))),
        ProviderType::OpenAI => {
            let key = api_key.filter(|k| !k.trim().is_empty()).ok_or_else(|| {
                AppError::Config(format!(
                    "OpenAI provider requires API key (set DOT_API_KEY or {})",
                    settings.api_key_env
                ))
            })?;
            Ok(Arc::new(OpenAiClient::with_base_url(endpoint, key)))
        }
    }
}
