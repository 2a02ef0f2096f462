//! Persistence boundaries: knowledge chunks, tenants, analysis sessions
//! and conversations.
//!
//! Every chunk read is parameterised by tenant id; no method returns
//! another tenant's data.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::types::{
    AnalysisSession, ChatExchange, KnowledgeChunk, NewChunk, NewTenant, SetupStatus, Tenant,
};
use dot_core::AppResult;
use std::sync::Arc;

/// A chunk with the similarity a store computed for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: KnowledgeChunk,
    pub similarity: f32,
}

#[async_trait::async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Persist a chunk and return its id.
    async fn insert_chunk(&self, chunk: NewChunk) -> AppResult<String>;

    /// All chunks of a tenant, in insertion order.
    async fn chunks_for_tenant(&self, tenant_id: &str) -> AppResult<Vec<KnowledgeChunk>>;

    /// Native vector search over chunks embedded by `provider`. `Ok(None)`
    /// means the store has none and the caller should rank in process.
    async fn similarity_search(
        &self,
        _tenant_id: &str,
        _query: &[f32],
        _provider: &str,
        _threshold: f32,
        _limit: usize,
    ) -> AppResult<Option<Vec<ScoredChunk>>> {
        Ok(None)
    }

    async fn chunk_count(&self, tenant_id: &str) -> AppResult<usize>;
}

#[async_trait::async_trait]
pub trait TenantStore: Send + Sync {
    async fn create_tenant(&self, tenant: NewTenant) -> AppResult<Tenant>;

    async fn get_tenant(&self, tenant_id: &str) -> AppResult<Option<Tenant>>;

    async fn list_tenants(&self) -> AppResult<Vec<Tenant>>;

    /// `NotFound` when the tenant does not exist.
    async fn set_setup_status(&self, tenant_id: &str, status: SetupStatus) -> AppResult<()>;

    /// Removes the tenant with its chunks, sessions and conversations.
    /// Returns whether a tenant was deleted.
    async fn delete_tenant(&self, tenant_id: &str) -> AppResult<bool>;
}

#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session in `running` state.
    async fn create_session(&self, tenant_id: &str, url: &str) -> AppResult<AnalysisSession>;

    /// `running -> completed`. Any other starting state is a `Store` error.
    async fn complete_session(
        &self,
        session_id: &str,
        urls_analyzed: u32,
        chunks_created: u32,
    ) -> AppResult<AnalysisSession>;

    /// `running -> failed`. Any other starting state is a `Store` error.
    async fn fail_session(&self, session_id: &str, error: &str) -> AppResult<AnalysisSession>;

    async fn get_session(&self, session_id: &str) -> AppResult<Option<AnalysisSession>>;

    /// Sessions of a tenant, oldest first.
    async fn sessions_for_tenant(&self, tenant_id: &str) -> AppResult<Vec<AnalysisSession>>;
}

#[async_trait::async_trait]
pub trait ConversationStore: Send + Sync {
    async fn append_exchange(&self, exchange: ChatExchange) -> AppResult<()>;

    /// Exchanges of a tenant, oldest first.
    async fn exchanges_for_tenant(&self, tenant_id: &str) -> AppResult<Vec<ChatExchange>>;
}

/// The four store capabilities, possibly backed by one object.
#[derive(Clone)]
pub struct Stores {
    pub knowledge: Arc<dyn KnowledgeStore>,
    pub tenants: Arc<dyn TenantStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub conversations: Arc<dyn ConversationStore>,
}

impl Stores {
    /// Use one backend for every capability.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: KnowledgeStore + TenantStore + SessionStore + ConversationStore + 'static,
    {
        Self {
            knowledge: store.clone(),
            tenants: store.clone(),
            sessions: store.clone(),
            conversations: store,
        }
    }
}
