//! Error types for Dot.
//!
//! This module defines a unified error enum covering configuration, I/O,
//! request validation, AI provider, analysis, storage and prompt failures.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification of a failed call to an external AI provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// Quota exhausted or request rate limited (HTTP 429)
    RateLimited,
    /// Missing or rejected credentials (HTTP 401/403)
    Authentication,
    /// The requested model does not exist or is not available to the account
    ModelUnavailable,
    /// The caller-side deadline elapsed
    Timeout,
    /// Network errors, server errors, malformed payloads
    Other,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::Authentication => "authentication",
            Self::ModelUnavailable => "model_unavailable",
            Self::Timeout => "timeout",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for Dot.
///
/// All fallible functions return `Result<T, AppError>`.
/// We never panic; errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed caller input (tenant id, url, message)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A referenced tenant, session or record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// An external AI provider call failed
    #[error("Provider '{provider}' unavailable ({kind}): {message}")]
    ProviderUnavailable {
        provider: String,
        kind: ProviderErrorKind,
        message: String,
    },

    /// Business-content analysis could not produce a result
    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    /// The persistence layer rejected a read or write
    #[error("Store error: {0}")]
    Store(String),

    /// Two vectors of different lengths were compared or produced
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Shorthand for building a `ProviderUnavailable` error.
    pub fn provider(
        provider: impl Into<String>,
        kind: ProviderErrorKind,
        message: impl Into<String>,
    ) -> Self {
        AppError::ProviderUnavailable {
            provider: provider.into(),
            kind,
            message: message.into(),
        }
    }

    /// Provider failure kind, if this is a provider error.
    pub fn provider_kind(&self) -> Option<ProviderErrorKind> {
        match self {
            AppError::ProviderUnavailable { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// HTTP status code used when this error reaches the HTTP boundary.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::InvalidRequest(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::ProviderUnavailable { .. } => 502,
            _ => 500,
        }
    }

    /// Short machine-readable label for the error category.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::NotFound(_) => "not_found",
            AppError::ProviderUnavailable { .. } => "provider_unavailable",
            AppError::AnalysisFailed(_) => "analysis_failed",
            AppError::Store(_) => "store_failure",
            AppError::DimensionMismatch { .. } => "dimension_mismatch",
            AppError::Prompt(_) => "prompt",
            AppError::Serialization(_) => "serialization",
            AppError::Other(_) => "internal",
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
