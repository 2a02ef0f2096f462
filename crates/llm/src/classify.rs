//! Mapping of raw provider failures onto `ProviderErrorKind`.
//!
//! Shared by every networked client (generation and embedding) so the
//! fallback chains see one taxonomy regardless of vendor.

use dot_core::{AppError, ProviderErrorKind};

/// Classify an HTTP error status and its body.
pub fn classify_status(status: u16, body: &str) -> ProviderErrorKind {
    let lowered = body.to_lowercase();
    match status {
        429 => ProviderErrorKind::RateLimited,
        401 | 403 => ProviderErrorKind::Authentication,
        404 => ProviderErrorKind::ModelUnavailable,
        _ if lowered.contains("model_not_found") || lowered.contains("does not exist") => {
            ProviderErrorKind::ModelUnavailable
        }
        _ if lowered.contains("insufficient_quota") || lowered.contains("rate limit") => {
            ProviderErrorKind::RateLimited
        }
        _ if lowered.contains("invalid_api_key") => ProviderErrorKind::Authentication,
        _ => ProviderErrorKind::Other,
    }
}

/// Build the error for a non-success HTTP response.
pub fn status_error(provider: &str, status: u16, body: &str) -> AppError {
    let kind = classify_status(status, body);
    AppError::provider(
        provider,
        kind,
        format!("HTTP {}: {}", status, truncate(body, 300)),
    )
}

/// Build the error for a transport-level failure (connect, TLS, body read).
pub fn transport_error(provider: &str, err: &reqwest::Error) -> AppError {
    let kind = if err.is_timeout() {
        ProviderErrorKind::Timeout
    } else if let Some(status) = err.status() {
        classify_status(status.as_u16(), "")
    } else {
        ProviderErrorKind::Other
    };
    AppError::provider(provider, kind, err.to_string())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
