//! Dot knowledge pipeline.
//!
//! Turns a website into tenant-scoped knowledge chunks and answers chat
//! messages from them:
//! - `analyzer`: URL to `BusinessInfo` (model-driven, template fallback)
//! - `chunker`: `BusinessInfo` to labeled text chunks
//! - `embeddings`: hosted and local embedding providers behind one chain
//! - `store`: tenant, chunk, session and conversation persistence
//! - `retriever`: vector ranking with substring fallback
//! - `rag`: response composition with canned and excerpt fallbacks
//! - `analysis` / `chat`: the two orchestrators

pub mod analysis;
pub mod analyzer;
pub mod api;
pub mod chat;
pub mod chunker;
pub mod embeddings;
pub mod progress;
pub mod rag;
pub mod retriever;
pub mod service;
pub mod stats;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

pub use analysis::{AnalysisOutcome, AnalysisService, CancelFlag, CancelGuard};
pub use api::{AnalyzeRequest, AnalyzeResponse, ChatRequest, ChatResponse, ErrorResponse};
pub use chat::{ChatReply, ChatService, TenantResolution};
pub use progress::{ProgressEvent, ProgressReporter};
pub use retriever::{RetrievedChunk, Retriever};
pub use service::ServiceSet;
pub use stats::{tenant_stats, TenantStats};
pub use store::{MemoryStore, SqliteStore, Stores};
pub use types::{
    AnalysisSession, BusinessInfo, ChatExchange, KnowledgeChunk, NewTenant, SessionStatus,
    SetupStatus, SourceType, Tenant,
};
