//! Embedding provider trait and factory.

use crate::embeddings::providers::{HashedBagProvider, OpenAiEmbeddingProvider};
use dot_core::{AppError, AppResult, EmbeddingSettings};
use std::sync::Arc;
use std::time::Duration;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "openai", "hashed")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results.pop().ok_or_else(|| {
            AppError::provider(
                self.provider_name(),
                dot_core::ProviderErrorKind::Other,
                "No embedding returned",
            )
        })
    }
}

/// Create the configured primary embedding provider.
///
/// Returns `Ok(None)` for the hosted provider when no API key is available,
/// so callers can still run on the local fallback.
pub fn create_provider(
    settings: &EmbeddingSettings,
    api_key: Option<&str>,
) -> AppResult<Option<Arc<dyn EmbeddingProvider>>> {
    match settings.provider.as_str() {
        "hashed" => Ok(Some(Arc::new(HashedBagProvider::new(settings.dimensions)))),

        "openai" => match api_key.filter(|key| !key.trim().is_empty()) {
            Some(key) => {
                let endpoint = settings
                    .endpoint
                    .as_deref()
                    .unwrap_or("https://api.openai.com/v1");
                let provider = OpenAiEmbeddingProvider::new(
                    endpoint,
                    key,
                    &settings.model,
                    settings.dimensions,
                    Duration::from_secs(settings.timeout_secs),
                )?;
                Ok(Some(Arc::new(provider)))
            }
            None => {
                tracing::warn!("No API key for the OpenAI embedding provider; using local fallback only");
                Ok(None)
            }
        },

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: openai, hashed",
            settings.provider
        ))),
    }
}
