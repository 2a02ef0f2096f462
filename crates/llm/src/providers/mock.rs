//! Scriptable in-process client for tests and offline runs.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use dot_core::{AppError, AppResult, ProviderErrorKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Script {
    Reply(String),
    Fail(ProviderErrorKind),
}

/// A client that either always replies with fixed text or always fails
/// with a given error kind. Records every request it receives.
#[derive(Debug)]
pub struct MockClient {
    script: Script,
    calls: AtomicUsize,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockClient {
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_script(Script::Reply(text.into()))
    }

    pub fn failing(kind: ProviderErrorKind) -> Self {
        Self::with_script(Script::Fail(kind))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of `complete` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<LlmRequest> {
        self.requests
            .lock()
            .ok()
            .and_then(|requests| requests.last().cloned())
    }
}

#[async_trait::async_trait]
impl LlmClient for MockClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        match &self.script {
            Script::Reply(text) => Ok(LlmResponse {
                content: text.clone(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            }),
            Script::Fail(kind) => Err(AppError::provider(
                "mock",
                *kind,
                format!("scripted {} failure", kind),
            )),
        }
    }
}
