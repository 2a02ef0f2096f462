//! Caller-side deadlines for provider calls.

use dot_core::{AppError, AppResult, ProviderErrorKind};
use std::future::Future;
use std::time::Duration;

/// Run `fut` with a deadline; an elapsed deadline becomes a `Timeout`
/// provider error so it flows through the same fallback path as any
/// other provider failure.
pub async fn with_deadline<T, F>(provider: &str, limit: Duration, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(provider, ?limit, "Provider call exceeded deadline");
            Err(AppError::provider(
                provider,
                ProviderErrorKind::Timeout,
                format!("no response within {:?}", limit),
            ))
        }
    }
}
