//! Ordered embedding fallback chain.

use crate::embeddings::provider::{create_provider, EmbeddingProvider};
use crate::embeddings::providers::HashedBagProvider;
use dot_core::{AppResult, EmbeddingSettings};
use dot_llm::with_deadline;
use std::sync::Arc;
use std::time::Duration;

/// A vector together with the provider that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedded {
    pub vector: Vec<f32>,
    pub provider: String,
}

/// Providers tried in order, each under the same per-call deadline.
#[derive(Debug, Clone)]
pub struct EmbeddingChain {
    providers: Vec<Arc<dyn EmbeddingProvider>>,
    timeout: Duration,
}

impl EmbeddingChain {
    pub fn new(providers: Vec<Arc<dyn EmbeddingProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    /// Build `[primary (when available), hashed (when fallback is enabled)]`.
    pub fn from_config(settings: &EmbeddingSettings, api_key: Option<&str>) -> AppResult<Self> {
        let mut providers: Vec<Arc<dyn EmbeddingProvider>> = Vec::new();

        if let Some(primary) = create_provider(settings, api_key)? {
            providers.push(primary);
        }

        let has_hashed = providers.iter().any(|p| p.provider_name() == "hashed");
        if settings.fallback && !has_hashed {
            providers.push(Arc::new(HashedBagProvider::new(settings.dimensions)));
        }

        tracing::debug!(
            providers = ?providers.iter().map(|p| p.provider_name()).collect::<Vec<_>>(),
            dimensions = settings.dimensions,
            "Embedding chain assembled"
        );

        Ok(Self::new(providers, Duration::from_secs(settings.timeout_secs)))
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.provider_name()).collect()
    }

    /// Embed `text` with the first provider that succeeds.
    ///
    /// Returns `None` when every provider fails; failures are logged, never raised.
    pub async fn embed(&self, text: &str) -> Option<Embedded> {
        for provider in &self.providers {
            let name = provider.provider_name();
            match with_deadline(name, self.timeout, provider.embed(text)).await {
                Ok(vector) if !vector.is_empty() && vector.len() == provider.dimensions() => {
                    return Some(Embedded {
                        vector,
                        provider: name.to_string(),
                    });
                }
                Ok(vector) => {
                    tracing::warn!(
                        provider = name,
                        expected = provider.dimensions(),
                        actual = vector.len(),
                        "Embedding provider returned a vector of the wrong length"
                    );
                }
                Err(e) => {
                    tracing::warn!(provider = name, error = %e, "Embedding provider failed, trying next");
                }
            }
        }

        tracing::warn!("All embedding providers failed; continuing without an embedding");
        None
    }
}
