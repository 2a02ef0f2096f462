//! Dot Core Library
//!
//! This crate provides the foundational utilities shared by every Dot crate:
//! - Error handling (`AppError`, `AppResult`, `ProviderErrorKind`)
//! - Logging infrastructure
//! - Configuration management

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{
    AnalysisSettings, AppConfig, ChatSettings, EmbeddingSettings, LlmSettings, RetrievalSettings,
    ServerSettings,
};
pub use error::{AppError, AppResult, ProviderErrorKind};
