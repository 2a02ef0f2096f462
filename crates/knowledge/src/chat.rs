//! Chat orchestration: one visitor message in, one grounded reply out.

use crate::api::{ChatRequest, ChatResponse};
use crate::embeddings::EmbeddingChain;
use crate::rag::{
    demo_knowledge, demo_persona, ComposeRequest, Persona, ResponseComposer, ResponseSource,
    DEMO_TENANT_ID,
};
use crate::retriever::Retriever;
use crate::store::Stores;
use crate::types::{ChatExchange, Tenant};
use chrono::Utc;
use dot_core::{AppError, AppResult, ChatSettings, LlmSettings};
use std::sync::Arc;

/// Who a chat turn is answered as.
#[derive(Debug, Clone, PartialEq)]
pub enum TenantResolution {
    /// A registered dot and its persona.
    Real { tenant: Tenant, persona: Persona },
    /// The built-in demonstration persona; never touches the stores.
    Demo(Persona),
}

impl TenantResolution {
    pub fn persona(&self) -> &Persona {
        match self {
            Self::Real { persona, .. } => persona,
            Self::Demo(persona) => persona,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub response: String,
    pub relevant_chunks_used: usize,
    pub source: ResponseSource,
}

impl From<ChatReply> for ChatResponse {
    fn from(reply: ChatReply) -> Self {
        Self {
            response: reply.response,
            relevant_chunks_used: reply.relevant_chunks_used,
        }
    }
}

#[derive(Clone)]
pub struct ChatService {
    stores: Stores,
    embeddings: EmbeddingChain,
    retriever: Retriever,
    composer: Arc<ResponseComposer>,
    llm: LlmSettings,
    chat: ChatSettings,
}

impl ChatService {
    pub fn new(
        stores: Stores,
        embeddings: EmbeddingChain,
        retriever: Retriever,
        composer: ResponseComposer,
        llm: &LlmSettings,
        chat: &ChatSettings,
    ) -> Self {
        Self {
            stores,
            embeddings,
            retriever,
            composer: Arc::new(composer),
            llm: llm.clone(),
            chat: chat.clone(),
        }
    }

    /// `NotFound` for an unknown tenant id.
    pub async fn resolve_tenant(&self, tenant_id: &str) -> AppResult<TenantResolution> {
        if tenant_id == DEMO_TENANT_ID {
            return Ok(TenantResolution::Demo(demo_persona(&self.llm, &self.chat)));
        }

        let tenant = self
            .stores
            .tenants
            .get_tenant(tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("dot {}", tenant_id)))?;
        let persona = Persona::for_tenant(&tenant, &self.llm, &self.chat);
        Ok(TenantResolution::Real { tenant, persona })
    }

    #[tracing::instrument(skip(self, request), fields(tenant_id = %request.tenant_id))]
    pub async fn chat(&self, request: ChatRequest) -> AppResult<ChatReply> {
        let tenant_id = request.tenant_id.trim();
        let message = request.message.trim();
        if tenant_id.is_empty() || message.is_empty() {
            return Err(AppError::InvalidRequest(
                "Missing required fields".to_string(),
            ));
        }

        let resolution = self.resolve_tenant(tenant_id).await?;
        let user_at = Utc::now();

        let chunks = match &resolution {
            TenantResolution::Demo(_) => demo_knowledge(message),
            TenantResolution::Real { tenant, .. } => self.retrieve(&tenant.id, message).await,
        };

        let composed = self
            .composer
            .compose(ComposeRequest {
                message,
                persona: resolution.persona(),
                chunks: &chunks,
                history: &request.history,
            })
            .await;

        if let TenantResolution::Real { tenant, .. } = &resolution {
            let exchange = ChatExchange {
                id: uuid::Uuid::new_v4().to_string(),
                tenant_id: tenant.id.clone(),
                user_message: message.to_string(),
                assistant_message: composed.text.clone(),
                relevant_chunks_used: chunks.len(),
                user_at,
                assistant_at: Utc::now(),
            };
            if let Err(e) = self.stores.conversations.append_exchange(exchange).await {
                tracing::error!(error = %e, "Failed to store conversation");
            }
        }

        tracing::info!(
            chunks = chunks.len(),
            source = ?composed.source,
            "Chat turn answered"
        );

        Ok(ChatReply {
            response: composed.text,
            relevant_chunks_used: chunks.len(),
            source: composed.source,
        })
    }

    /// Retrieval never fails a chat turn; errors leave the context empty.
    async fn retrieve(&self, tenant_id: &str, message: &str) -> Vec<String> {
        let embedded = self.embeddings.embed(message).await;
        if embedded.is_none() {
            tracing::debug!("No query embedding, using text search");
        }

        match self
            .retriever
            .retrieve(
                self.stores.knowledge.as_ref(),
                tenant_id,
                message,
                embedded.as_ref(),
                self.retriever.limit(),
            )
            .await
        {
            Ok(chunks) => chunks.into_iter().map(|c| c.content).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Knowledge base search failed");
                Vec::new()
            }
        }
    }
}
