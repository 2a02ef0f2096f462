//! Assembles the analysis and chat services from configuration.

use crate::analysis::AnalysisService;
use crate::analyzer::{AnalyzerChain, BusinessAnalyzer, ModelAnalyzer, TemplateAnalyzer};
use crate::chat::ChatService;
use crate::embeddings::EmbeddingChain;
use crate::rag::ResponseComposer;
use crate::retriever::Retriever;
use crate::store::{SqliteStore, Stores};
use dot_core::{AppConfig, AppResult};
use dot_llm::{create_client, LlmClient};
use dot_prompt::{load_prompt, ANALYSIS_BUSINESS, CHAT_RESPOND};
use std::sync::Arc;
use std::time::Duration;

/// Everything a front end needs, wired from one configuration.
#[derive(Clone)]
pub struct ServiceSet {
    pub stores: Stores,
    pub analysis: AnalysisService,
    pub chat: ChatService,
}

impl ServiceSet {
    /// Open the workspace SQLite store and assemble the services on it.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        config.ensure_dot_dir()?;
        let store = Arc::new(SqliteStore::open(&config.store_path())?);
        Self::with_stores(config, Stores::shared(store))
    }

    /// Assemble the services on the given stores.
    ///
    /// A missing generation provider is not an error: analysis then uses
    /// the template analyzer and chat uses the fallback responses.
    pub fn with_stores(config: &AppConfig, stores: Stores) -> AppResult<Self> {
        let api_key = config.resolve_api_key();

        let client: Option<Arc<dyn LlmClient>> = match create_client(&config.llm, api_key.as_deref())
        {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "No generation provider available, using fallbacks");
                None
            }
        };

        let mut analyzers: Vec<Arc<dyn BusinessAnalyzer>> = Vec::new();
        if let Some(client) = &client {
            let prompt = load_prompt(&config.workspace, ANALYSIS_BUSINESS)?;
            analyzers.push(Arc::new(ModelAnalyzer::new(
                client.clone(),
                prompt,
                &config.analysis,
            )));
        }
        analyzers.push(Arc::new(TemplateAnalyzer::new()));
        let analyzers = AnalyzerChain::new(analyzers);

        let embeddings = EmbeddingChain::from_config(&config.embedding, api_key.as_deref())?;
        if embeddings.is_empty() {
            tracing::warn!("No embedding providers configured; retrieval will use text search");
        }

        let composer = ResponseComposer::new(
            client,
            load_prompt(&config.workspace, CHAT_RESPOND)?,
            &config.chat,
            config.retrieval.history_turns,
            Duration::from_secs(config.llm.timeout_secs),
        );

        tracing::debug!(
            analyzers = ?analyzers.names(),
            embeddings = ?embeddings.provider_names(),
            "Services assembled"
        );

        let analysis = AnalysisService::new(
            stores.clone(),
            analyzers,
            embeddings.clone(),
            &config.analysis,
        );
        let chat = ChatService::new(
            stores.clone(),
            embeddings,
            Retriever::new(&config.retrieval),
            composer,
            &config.llm,
            &config.chat,
        );

        Ok(Self {
            stores,
            analysis,
            chat,
        })
    }
}
