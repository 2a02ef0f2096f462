//! Analysis orchestration: URL in, stored knowledge chunks out.
//!
//! Validates the request, records an analysis session, runs the analyzer
//! chain, chunks the result and embeds and stores every chunk with bounded
//! concurrency. Per-chunk embedding and store failures are logged and
//! skipped; only invalid input, an unknown tenant, session bookkeeping
//! failures or a total analyzer failure abort the run.

use crate::analyzer::AnalyzerChain;
use crate::api::{AnalyzeRequest, AnalyzeResponse};
use crate::chunker::{self, KnowledgeSection};
use crate::embeddings::EmbeddingChain;
use crate::progress::ProgressReporter;
use crate::store::Stores;
use crate::types::{BusinessInfo, NewChunk, SetupStatus, SourceType};
use dot_core::{AnalysisSettings, AppError, AppResult};
use futures::stream::{self, StreamExt};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Cooperative cancellation shared between a caller and a running analysis.
///
/// Work already dispatched runs to completion; no new chunk starts once the
/// flag is set.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// A guard that cancels this flag when dropped.
    pub fn guard(&self) -> CancelGuard {
        CancelGuard(self.clone())
    }
}

/// Cancels its flag on drop.
#[derive(Debug)]
pub struct CancelGuard(CancelFlag);

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Result of a finished analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub session_id: String,
    pub urls_analyzed: u32,
    pub chunks_created: u32,
    pub business_info: BusinessInfo,
    pub message: String,
    /// Name of the analyzer that produced `business_info`
    pub analyzer: String,
    /// True when cancellation stopped chunks from being dispatched
    pub cancelled: bool,
}

impl From<AnalysisOutcome> for AnalyzeResponse {
    fn from(outcome: AnalysisOutcome) -> Self {
        Self {
            success: true,
            session_id: outcome.session_id,
            urls_analyzed: outcome.urls_analyzed,
            chunks_created: outcome.chunks_created,
            business_info: outcome.business_info,
            message: outcome.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ChunkOutcome {
    Stored,
    Failed,
    Skipped,
}

/// Shared, read-only inputs of every chunk task in one run.
struct ChunkContext<'a> {
    tenant_id: &'a str,
    url: &'a str,
    analyzer: &'a str,
    total: usize,
    business_info: &'a serde_json::Value,
    finished: &'a AtomicU64,
    cancel: &'a CancelFlag,
}

#[derive(Clone)]
pub struct AnalysisService {
    stores: Stores,
    analyzers: AnalyzerChain,
    embeddings: EmbeddingChain,
    concurrency: usize,
    progress: ProgressReporter,
}

impl AnalysisService {
    pub fn new(
        stores: Stores,
        analyzers: AnalyzerChain,
        embeddings: EmbeddingChain,
        settings: &AnalysisSettings,
    ) -> Self {
        Self {
            stores,
            analyzers,
            embeddings,
            concurrency: settings.concurrency.max(1),
            progress: ProgressReporter::noop(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    #[tracing::instrument(skip(self, request, cancel), fields(tenant_id = %request.tenant_id))]
    pub async fn analyze(
        &self,
        request: AnalyzeRequest,
        cancel: CancelFlag,
    ) -> AppResult<AnalysisOutcome> {
        let tenant_id = request.tenant_id.trim();
        let url = request.url.trim();
        validate_request(tenant_id, url)?;

        self.stores
            .tenants
            .get_tenant(tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("dot {}", tenant_id)))?;

        let session = self.stores.sessions.create_session(tenant_id, url).await?;
        tracing::info!(session_id = %session.id, url, "Starting website analysis");

        let instructions = request.custom_instructions.as_deref();
        let (info, analyzer) = match self.analyzers.analyze(url, instructions).await {
            Ok(result) => result,
            Err(e) => {
                if let Err(store_err) = self
                    .stores
                    .sessions
                    .fail_session(&session.id, &e.to_string())
                    .await
                {
                    tracing::error!(error = %store_err, "Failed to mark analysis session as failed");
                }
                return Err(e);
            }
        };
        self.progress.analyze(url, &analyzer);

        let sections = chunker::sections(&info);
        let total = sections.len();
        self.progress.chunk(total as u64);
        tracing::info!(chunks = total, analyzer = %analyzer, "Generated knowledge chunks");

        let snapshot = serde_json::to_value(&info).unwrap_or_default();
        let finished = AtomicU64::new(0);
        let ctx = ChunkContext {
            tenant_id,
            url,
            analyzer: &analyzer,
            total,
            business_info: &snapshot,
            finished: &finished,
            cancel: &cancel,
        };

        let outcomes: Vec<ChunkOutcome> = stream::iter(sections.into_iter().enumerate())
            .map(|(index, section)| self.process_chunk(&ctx, index, section))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let stored = outcomes.iter().filter(|o| **o == ChunkOutcome::Stored).count() as u32;
        let failed = outcomes.iter().filter(|o| **o == ChunkOutcome::Failed).count();
        let cancelled = outcomes.iter().any(|o| *o == ChunkOutcome::Skipped);

        self.stores
            .sessions
            .complete_session(&session.id, 1, stored)
            .await?;
        self.stores
            .tenants
            .set_setup_status(tenant_id, SetupStatus::Connected)
            .await?;

        let message = if cancelled {
            format!(
                "Analysis cancelled after creating {} knowledge chunks.",
                stored
            )
        } else {
            format!(
                "Successfully analyzed website and created {} knowledge chunks.",
                stored
            )
        };

        tracing::info!(
            session_id = %session.id,
            stored,
            failed,
            cancelled,
            "Website analysis completed"
        );

        Ok(AnalysisOutcome {
            session_id: session.id,
            urls_analyzed: 1,
            chunks_created: stored,
            business_info: info,
            message,
            analyzer,
            cancelled,
        })
    }

    async fn process_chunk(
        &self,
        ctx: &ChunkContext<'_>,
        index: usize,
        section: KnowledgeSection,
    ) -> ChunkOutcome {
        if ctx.cancel.is_cancelled() {
            tracing::debug!(chunk_index = index, "Cancelled before dispatch");
            return ChunkOutcome::Skipped;
        }

        let embedded = self.embeddings.embed(&section.text).await;
        let provider = embedded.as_ref().map(|e| e.provider.clone());
        if embedded.is_none() {
            tracing::warn!(chunk_index = index, "Storing chunk without embedding");
        }

        let metadata = json!({
            "method": "ai_analysis",
            "chunkIndex": index,
            "totalChunks": ctx.total,
            "section": section.kind.as_str(),
            "analyzer": ctx.analyzer,
            "embeddingProvider": provider,
            "contentHash": content_hash(&section.text),
            "businessInfo": ctx.business_info,
        });

        let chunk = NewChunk {
            tenant_id: ctx.tenant_id.to_string(),
            content: section.text,
            source_type: SourceType::Analysis,
            source_url: ctx.url.to_string(),
            embedding: embedded.map(|e| e.vector),
            embedding_provider: provider.clone(),
            metadata,
        };

        let outcome = match self.stores.knowledge.insert_chunk(chunk).await {
            Ok(id) => {
                tracing::debug!(chunk_index = index, chunk_id = %id, "Stored chunk");
                ChunkOutcome::Stored
            }
            Err(e) => {
                tracing::error!(chunk_index = index, error = %e, "Failed to store chunk");
                ChunkOutcome::Failed
            }
        };

        let done = ctx.finished.fetch_add(1, Ordering::SeqCst) + 1;
        if outcome == ChunkOutcome::Stored {
            self.progress.store(done, ctx.total as u64, provider.as_deref());
        }
        outcome
    }
}

/// Tenant id and URL must be present; the URL must be absolute http(s) with a host.
pub fn validate_request(tenant_id: &str, url: &str) -> AppResult<()> {
    if tenant_id.is_empty() || url.is_empty() {
        return Err(AppError::InvalidRequest(
            "Dot ID and URL are required".to_string(),
        ));
    }

    let parsed = reqwest::Url::parse(url)
        .map_err(|e| AppError::InvalidRequest(format!("Invalid URL '{}': {}", url, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::InvalidRequest(format!(
            "Invalid URL '{}': scheme must be http or https",
            url
        )));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(AppError::InvalidRequest(format!(
            "Invalid URL '{}': missing host",
            url
        )));
    }
    Ok(())
}

fn content_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}
