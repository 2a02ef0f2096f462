//! Per-tenant knowledge base statistics.

use crate::store::Stores;
use crate::types::{AnalysisSession, Tenant};
use dot_core::{AppError, AppResult};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantStats {
    pub tenant: Tenant,
    pub chunks: usize,
    /// Chunks stored with an embedding
    pub embedded_chunks: usize,
    pub sessions: usize,
    pub last_session: Option<AnalysisSession>,
    pub conversations: usize,
}

pub async fn tenant_stats(stores: &Stores, tenant_id: &str) -> AppResult<TenantStats> {
    let tenant = stores
        .tenants
        .get_tenant(tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("dot {}", tenant_id)))?;

    let chunks = stores.knowledge.chunks_for_tenant(tenant_id).await?;
    let embedded_chunks = chunks.iter().filter(|c| c.embedding.is_some()).count();
    let mut sessions = stores.sessions.sessions_for_tenant(tenant_id).await?;
    let conversations = stores.conversations.exchanges_for_tenant(tenant_id).await?;

    Ok(TenantStats {
        tenant,
        chunks: chunks.len(),
        embedded_chunks,
        sessions: sessions.len(),
        last_session: sessions.pop(),
        conversations: conversations.len(),
    })
}
