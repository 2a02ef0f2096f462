//! In-process store used by tests and one-shot runs.

use super::{ConversationStore, KnowledgeStore, SessionStore, TenantStore};
use crate::types::{
    AnalysisSession, ChatExchange, KnowledgeChunk, NewChunk, NewTenant, SessionStatus,
    SetupStatus, Tenant,
};
use chrono::Utc;
use dot_core::{AppError, AppResult};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Inner {
    tenants: Vec<Tenant>,
    chunks: Vec<KnowledgeChunk>,
    sessions: Vec<AnalysisSession>,
    exchanges: Vec<ChatExchange>,
}

/// All four store capabilities over plain vectors.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| AppError::Store("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| AppError::Store("memory store lock poisoned".to_string()))
    }

    fn transition(
        &self,
        session_id: &str,
        apply: impl FnOnce(&mut AnalysisSession),
    ) -> AppResult<AnalysisSession> {
        let mut inner = self.write()?;
        let session = inner
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| AppError::NotFound(format!("analysis session {}", session_id)))?;

        if session.status != SessionStatus::Running {
            return Err(AppError::Store(format!(
                "analysis session {} is already {}",
                session_id, session.status
            )));
        }

        apply(session);
        session.completed_at = Some(Utc::now());
        Ok(session.clone())
    }
}

#[async_trait::async_trait]
impl KnowledgeStore for MemoryStore {
    async fn insert_chunk(&self, chunk: NewChunk) -> AppResult<String> {
        let mut inner = self.write()?;
        if !inner.tenants.iter().any(|t| t.id == chunk.tenant_id) {
            return Err(AppError::Store(format!(
                "cannot insert chunk for unknown tenant {}",
                chunk.tenant_id
            )));
        }

        let id = uuid::Uuid::new_v4().to_string();
        inner.chunks.push(KnowledgeChunk {
            id: id.clone(),
            tenant_id: chunk.tenant_id,
            content: chunk.content,
            source_type: chunk.source_type,
            source_url: chunk.source_url,
            embedding: chunk.embedding,
            embedding_provider: chunk.embedding_provider,
            metadata: chunk.metadata,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn chunks_for_tenant(&self, tenant_id: &str) -> AppResult<Vec<KnowledgeChunk>> {
        Ok(self
            .read()?
            .chunks
            .iter()
            .filter(|c| c.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn chunk_count(&self, tenant_id: &str) -> AppResult<usize> {
        Ok(self
            .read()?
            .chunks
            .iter()
            .filter(|c| c.tenant_id == tenant_id)
            .count())
    }
}

#[async_trait::async_trait]
impl TenantStore for MemoryStore {
    async fn create_tenant(&self, tenant: NewTenant) -> AppResult<Tenant> {
        let tenant = Tenant::from_new(uuid::Uuid::new_v4().to_string(), tenant);
        self.write()?.tenants.push(tenant.clone());
        Ok(tenant)
    }

    async fn get_tenant(&self, tenant_id: &str) -> AppResult<Option<Tenant>> {
        Ok(self
            .read()?
            .tenants
            .iter()
            .find(|t| t.id == tenant_id)
            .cloned())
    }

    async fn list_tenants(&self) -> AppResult<Vec<Tenant>> {
        Ok(self.read()?.tenants.clone())
    }

    async fn set_setup_status(&self, tenant_id: &str, status: SetupStatus) -> AppResult<()> {
        let mut inner = self.write()?;
        let tenant = inner
            .tenants
            .iter_mut()
            .find(|t| t.id == tenant_id)
            .ok_or_else(|| AppError::NotFound(format!("tenant {}", tenant_id)))?;
        tenant.setup_status = status;
        Ok(())
    }

    async fn delete_tenant(&self, tenant_id: &str) -> AppResult<bool> {
        let mut inner = self.write()?;
        let before = inner.tenants.len();
        inner.tenants.retain(|t| t.id != tenant_id);
        if inner.tenants.len() == before {
            return Ok(false);
        }
        inner.chunks.retain(|c| c.tenant_id != tenant_id);
        inner.sessions.retain(|s| s.tenant_id != tenant_id);
        inner.exchanges.retain(|e| e.tenant_id != tenant_id);
        Ok(true)
    }
}

#[async_trait::async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, tenant_id: &str, url: &str) -> AppResult<AnalysisSession> {
        let mut inner = self.write()?;
        if !inner.tenants.iter().any(|t| t.id == tenant_id) {
            return Err(AppError::Store(format!(
                "cannot create session for unknown tenant {}",
                tenant_id
            )));
        }
        let session = AnalysisSession::start(tenant_id, url);
        inner.sessions.push(session.clone());
        Ok(session)
    }

    async fn complete_session(
        &self,
        session_id: &str,
        urls_analyzed: u32,
        chunks_created: u32,
    ) -> AppResult<AnalysisSession> {
        self.transition(session_id, |s| {
            s.status = SessionStatus::Completed;
            s.urls_analyzed = urls_analyzed;
            s.chunks_created = chunks_created;
        })
    }

    async fn fail_session(&self, session_id: &str, error: &str) -> AppResult<AnalysisSession> {
        self.transition(session_id, |s| {
            s.status = SessionStatus::Failed;
            s.error_message = Some(error.to_string());
        })
    }

    async fn get_session(&self, session_id: &str) -> AppResult<Option<AnalysisSession>> {
        Ok(self
            .read()?
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .cloned())
    }

    async fn sessions_for_tenant(&self, tenant_id: &str) -> AppResult<Vec<AnalysisSession>> {
        Ok(self
            .read()?
            .sessions
            .iter()
            .filter(|s| s.tenant_id == tenant_id)
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl ConversationStore for MemoryStore {
    async fn append_exchange(&self, exchange: ChatExchange) -> AppResult<()> {
        let mut inner = self.write()?;
        if !inner.tenants.iter().any(|t| t.id == exchange.tenant_id) {
            return Err(AppError::Store(format!(
                "cannot store exchange for unknown tenant {}",
                exchange.tenant_id
            )));
        }
        inner.exchanges.push(exchange);
        Ok(())
    }

    async fn exchanges_for_tenant(&self, tenant_id: &str) -> AppResult<Vec<ChatExchange>> {
        Ok(self
            .read()?
            .exchanges
            .iter()
            .filter(|e| e.tenant_id == tenant_id)
            .cloned()
            .collect())
    }
}
