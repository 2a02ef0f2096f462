//! Test doubles shared by the scenario tests.

use crate::analyzer::BusinessAnalyzer;
use crate::embeddings::{EmbeddingChain, EmbeddingProvider, HashedBagProvider};
use crate::store::{
    ConversationStore, KnowledgeStore, MemoryStore, SessionStore, Stores, TenantStore,
};
use crate::types::{
    AnalysisSession, BusinessInfo, ChatExchange, KnowledgeChunk, NewChunk, NewTenant,
    SetupStatus, Tenant,
};
use dot_core::{AppError, AppResult, ProviderErrorKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const DIMS: usize = 64;

pub fn memory_stores() -> (Arc<MemoryStore>, Stores) {
    let store = Arc::new(MemoryStore::new());
    (store.clone(), Stores::shared(store))
}

pub async fn create_tenant(store: &MemoryStore, name: &str) -> Tenant {
    store
        .create_tenant(NewTenant {
            name: name.to_string(),
            domain: format!("{}.test", name.to_lowercase()),
            business_context: Some(format!("{} builds things.", name)),
            ..Default::default()
        })
        .await
        .unwrap()
}

pub fn hashed_chain() -> EmbeddingChain {
    EmbeddingChain::new(
        vec![Arc::new(HashedBagProvider::new(DIMS))],
        Duration::from_secs(5),
    )
}

pub fn failing_chain() -> EmbeddingChain {
    EmbeddingChain::new(vec![Arc::new(FailingEmbedder)], Duration::from_secs(5))
}

#[derive(Debug)]
pub struct FailingEmbedder;

#[async_trait::async_trait]
impl EmbeddingProvider for FailingEmbedder {
    fn provider_name(&self) -> &str {
        "failing"
    }

    fn model_name(&self) -> &str {
        "none"
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    async fn embed_batch(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Err(AppError::provider(
            "failing",
            ProviderErrorKind::Authentication,
            "invalid key",
        ))
    }
}

/// Always fails the way a quota-exhausted model analyzer does.
pub struct QuotaAnalyzer;

#[async_trait::async_trait]
impl BusinessAnalyzer for QuotaAnalyzer {
    fn name(&self) -> &str {
        "model"
    }

    async fn analyze(&self, _url: &str, _custom: Option<&str>) -> AppResult<BusinessInfo> {
        Err(AppError::AnalysisFailed(
            "quota exceeded; check billing or try again later".to_string(),
        ))
    }
}

/// Delegates to a `MemoryStore` but rejects chunks whose content starts
/// with `reject_prefix`.
pub struct FlakyKnowledgeStore {
    pub inner: Arc<MemoryStore>,
    pub reject_prefix: &'static str,
}

#[async_trait::async_trait]
impl KnowledgeStore for FlakyKnowledgeStore {
    async fn insert_chunk(&self, chunk: NewChunk) -> AppResult<String> {
        if chunk.content.starts_with(self.reject_prefix) {
            return Err(AppError::Store("simulated write failure".to_string()));
        }
        self.inner.insert_chunk(chunk).await
    }

    async fn chunks_for_tenant(&self, tenant_id: &str) -> AppResult<Vec<KnowledgeChunk>> {
        self.inner.chunks_for_tenant(tenant_id).await
    }

    async fn chunk_count(&self, tenant_id: &str) -> AppResult<usize> {
        self.inner.chunk_count(tenant_id).await
    }
}

/// Delegates to a `MemoryStore`, holding each insert longer the lower its
/// `chunkIndex`, so later sections finish first.
pub struct ReversingKnowledgeStore {
    pub inner: Arc<MemoryStore>,
}

#[async_trait::async_trait]
impl KnowledgeStore for ReversingKnowledgeStore {
    async fn insert_chunk(&self, chunk: NewChunk) -> AppResult<String> {
        let index = chunk.metadata["chunkIndex"].as_u64().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(10 * 10u64.saturating_sub(index))).await;
        self.inner.insert_chunk(chunk).await
    }

    async fn chunks_for_tenant(&self, tenant_id: &str) -> AppResult<Vec<KnowledgeChunk>> {
        self.inner.chunks_for_tenant(tenant_id).await
    }

    async fn chunk_count(&self, tenant_id: &str) -> AppResult<usize> {
        self.inner.chunk_count(tenant_id).await
    }
}

/// Counts every call and fails it.
#[derive(Default)]
pub struct UnreachableStore {
    calls: AtomicUsize,
}

impl UnreachableStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch<T>(&self) -> AppResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AppError::Store("store unavailable".to_string()))
    }
}

#[async_trait::async_trait]
impl KnowledgeStore for UnreachableStore {
    async fn insert_chunk(&self, _chunk: NewChunk) -> AppResult<String> {
        self.touch()
    }

    async fn chunks_for_tenant(&self, _tenant_id: &str) -> AppResult<Vec<KnowledgeChunk>> {
        self.touch()
    }

    async fn chunk_count(&self, _tenant_id: &str) -> AppResult<usize> {
        self.touch()
    }
}

#[async_trait::async_trait]
impl TenantStore for UnreachableStore {
    async fn create_tenant(&self, _tenant: NewTenant) -> AppResult<Tenant> {
        self.touch()
    }

    async fn get_tenant(&self, _tenant_id: &str) -> AppResult<Option<Tenant>> {
        self.touch()
    }

    async fn list_tenants(&self) -> AppResult<Vec<Tenant>> {
        self.touch()
    }

    async fn set_setup_status(&self, _tenant_id: &str, _status: SetupStatus) -> AppResult<()> {
        self.touch()
    }

    async fn delete_tenant(&self, _tenant_id: &str) -> AppResult<bool> {
        self.touch()
    }
}

#[async_trait::async_trait]
impl SessionStore for UnreachableStore {
    async fn create_session(&self, _tenant_id: &str, _url: &str) -> AppResult<AnalysisSession> {
        self.touch()
    }

    async fn complete_session(
        &self,
        _session_id: &str,
        _urls_analyzed: u32,
        _chunks_created: u32,
    ) -> AppResult<AnalysisSession> {
        self.touch()
    }

    async fn fail_session(&self, _session_id: &str, _error: &str) -> AppResult<AnalysisSession> {
        self.touch()
    }

    async fn get_session(&self, _session_id: &str) -> AppResult<Option<AnalysisSession>> {
        self.touch()
    }

    async fn sessions_for_tenant(&self, _tenant_id: &str) -> AppResult<Vec<AnalysisSession>> {
        self.touch()
    }
}

#[async_trait::async_trait]
impl ConversationStore for UnreachableStore {
    async fn append_exchange(&self, _exchange: ChatExchange) -> AppResult<()> {
        self.touch()
    }

    async fn exchanges_for_tenant(&self, _tenant_id: &str) -> AppResult<Vec<ChatExchange>> {
        self.touch()
    }
}
