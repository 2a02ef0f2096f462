//! HTTP server for the embeddable chat widget.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/analyze` | Analyze a website into a dot's knowledge base |
//! | `POST` | `/api/chat` | Answer one visitor message |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! Errors are `{ "error": ..., "details"?: ... }` with the status taken from
//! `AppError::http_status`. All origins are allowed so the widget can call
//! the API from any customer site.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Args;
use dot_core::{config::AppConfig, AppError, AppResult};
use dot_knowledge::{
    AnalyzeRequest, AnalyzeResponse, CancelFlag, ChatRequest, ChatResponse, ErrorResponse,
    ServiceSet,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

/// Serve the analyze and chat HTTP API
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to listen on (default: server.bind)
    #[arg(short, long, env = "DOT_BIND")]
    pub bind: Option<String>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let bind = self.bind.as_deref().unwrap_or(&config.server.bind);
        let services = ServiceSet::from_config(config)?;

        let listener = tokio::net::TcpListener::bind(bind).await?;
        tracing::info!(bind, "Dot API listening");
        println!("Dot API listening on http://{}", listener.local_addr()?);

        axum::serve(listener, router(services)).await?;
        Ok(())
    }
}

pub fn router(services: ServiceSet) -> Router {
    Router::new()
        .route("/api/analyze", post(handle_analyze))
        .route("/api/chat", post(handle_chat))
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(services)
}

/// An `AppError` raised while serving `operation`.
struct ApiError {
    operation: &'static str,
    error: AppError,
}

impl ApiError {
    fn new(operation: &'static str, error: AppError) -> Self {
        Self { operation, error }
    }

    fn bad_body(operation: &'static str, rejection: JsonRejection) -> Self {
        Self::new(operation, AppError::InvalidRequest(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(operation = self.operation, error = %self.error, "Request failed");
        }
        let body = ErrorResponse::from_error(self.operation, &self.error);
        (status, Json(body)).into_response()
    }
}

/// The run is spawned so that a dropped connection only stops new chunks
/// from being dispatched: the guard cancels when this handler is dropped.
async fn handle_analyze(
    State(services): State<ServiceSet>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(request) = payload.map_err(|r| ApiError::bad_body("Analysis", r))?;

    let cancel = CancelFlag::new();
    let _guard = cancel.guard();
    let analysis = services.analysis.clone();
    let task = tokio::spawn(async move { analysis.analyze(request, cancel).await });

    match task.await {
        Ok(Ok(outcome)) => Ok(Json(outcome.into())),
        Ok(Err(e)) => Err(ApiError::new("Analysis", e)),
        Err(e) => Err(ApiError::new(
            "Analysis",
            AppError::Other(format!("analysis task aborted: {}", e)),
        )),
    }
}

async fn handle_chat(
    State(services): State<ServiceSet>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|r| ApiError::bad_body("Chat", r))?;

    services
        .chat
        .chat(request)
        .await
        .map(|reply| Json(reply.into()))
        .map_err(|e| ApiError::new("Chat", e))
}

async fn handle_health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dot_knowledge::store::TenantStore;
    use dot_knowledge::{MemoryStore, NewTenant, Stores};
    use std::net::SocketAddr;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn spawn_server(store: Arc<MemoryStore>, workspace: &TempDir) -> SocketAddr {
        let mut config = AppConfig {
            workspace: workspace.path().to_path_buf(),
            ..Default::default()
        };
        config.api_key = None;
        config.llm.api_key_env = "DOT_SERVE_TEST_KEY_NEVER_SET".to_string();
        config.embedding.provider = "hashed".to_string();
        config.embedding.dimensions = 64;

        let services = ServiceSet::with_stores(&config, Stores::shared(store)).unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(services)).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_analyze_then_chat_over_http() {
        let workspace = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        let tenant = store
            .create_tenant(NewTenant {
                name: "Acme".to_string(),
                domain: "acme.com".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let addr = spawn_server(store, &workspace).await;
        let client = reqwest::Client::new();

        let analyzed: Value = client
            .post(format!("http://{}/api/analyze", addr))
            .json(&json!({ "dotId": tenant.id, "url": "https://acme.com" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(analyzed["success"], true);
        assert_eq!(analyzed["chunksCreated"], 10);
        assert_eq!(analyzed["urlsAnalyzed"], 1);

        let chat: Value = client
            .post(format!("http://{}/api/chat", addr))
            .json(&json!({ "tenantId": tenant.id, "message": "hello" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(!chat["response"].as_str().unwrap().is_empty());
        assert!(chat["relevantChunksUsed"].is_u64());
    }

    #[tokio::test]
    async fn test_error_responses() {
        let workspace = TempDir::new().unwrap();
        let addr = spawn_server(Arc::new(MemoryStore::new()), &workspace).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("http://{}/api/analyze", addr))
            .json(&json!({ "dotId": "d1", "url": "" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Dot ID and URL are required");

        let response = client
            .post(format!("http://{}/api/chat", addr))
            .json(&json!({ "tenantId": "missing", "message": "hi" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Dot not found");

        let response = client
            .post(format!("http://{}/api/chat", addr))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn test_health() {
        let workspace = TempDir::new().unwrap();
        let addr = spawn_server(Arc::new(MemoryStore::new()), &workspace).await;

        let body: Value = reqwest::get(format!("http://{}/health", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
    }
}
