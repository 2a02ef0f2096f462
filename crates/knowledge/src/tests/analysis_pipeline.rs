use super::support::*;
use crate::analysis::{AnalysisService, CancelFlag};
use crate::analyzer::{AnalyzerChain, BusinessAnalyzer, ModelAnalyzer, TemplateAnalyzer};
use crate::api::AnalyzeRequest;
use crate::chunker;
use crate::embeddings::EmbeddingChain;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::store::{KnowledgeStore, MemoryStore, SessionStore, SqliteStore, Stores, TenantStore};
use crate::types::{NewTenant, SessionStatus, SetupStatus};
use dot_core::{AnalysisSettings, AppError, ProviderErrorKind};
use dot_llm::MockClient;
use dot_prompt::{load_builtin, ANALYSIS_BUSINESS};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn template_only() -> AnalyzerChain {
    AnalyzerChain::new(vec![Arc::new(TemplateAnalyzer::new())])
}

fn service(stores: Stores, analyzers: AnalyzerChain, embeddings: EmbeddingChain) -> AnalysisService {
    AnalysisService::new(stores, analyzers, embeddings, &AnalysisSettings::default())
}

fn request(tenant_id: &str, url: &str) -> AnalyzeRequest {
    AnalyzeRequest {
        tenant_id: tenant_id.to_string(),
        url: url.to_string(),
        custom_instructions: None,
    }
}

#[tokio::test]
async fn test_template_fallback_stores_every_section() {
    let (store, stores) = memory_stores();
    let tenant = create_tenant(&store, "Acme").await;
    let analyzers = AnalyzerChain::new(vec![
        Arc::new(QuotaAnalyzer) as Arc<dyn BusinessAnalyzer>,
        Arc::new(TemplateAnalyzer::new()),
    ]);
    let service = service(stores, analyzers, hashed_chain());

    let outcome = service
        .analyze(request(&tenant.id, "https://acme.com"), CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(outcome.analyzer, "template");
    assert_eq!(outcome.urls_analyzed, 1);
    assert_eq!(outcome.chunks_created, 10);
    assert!(!outcome.cancelled);
    assert_eq!(outcome.business_info.company.name, "Acme Solutions");
    assert_eq!(
        outcome.message,
        "Successfully analyzed website and created 10 knowledge chunks."
    );

    let session = store.get_session(&outcome.session_id).await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.urls_analyzed, 1);
    assert_eq!(session.chunks_created, 10);
    assert!(session.completed_at.is_some());

    let tenant = store.get_tenant(&tenant.id).await.unwrap().unwrap();
    assert_eq!(tenant.setup_status, SetupStatus::Connected);

    let chunks = store.chunks_for_tenant(&tenant.id).await.unwrap();
    assert_eq!(chunks.len(), 10);

    let indexes: BTreeSet<u64> = chunks
        .iter()
        .map(|c| c.metadata["chunkIndex"].as_u64().unwrap())
        .collect();
    assert_eq!(indexes, (0..10).collect::<BTreeSet<u64>>());

    for chunk in &chunks {
        assert_eq!(chunk.source_url, "https://acme.com");
        assert_eq!(chunk.embedding.as_ref().map(Vec::len), Some(DIMS));
        assert_eq!(chunk.metadata["method"], "ai_analysis");
        assert_eq!(chunk.metadata["totalChunks"], 10);
        assert_eq!(chunk.metadata["analyzer"], "template");
        assert_eq!(chunk.metadata["embeddingProvider"], "hashed");
        assert_eq!(chunk.embedding_provider.as_deref(), Some("hashed"));
        assert_eq!(chunk.metadata["contentHash"].as_str().map(str::len), Some(64));
        assert_eq!(
            chunk.metadata["businessInfo"]["company"]["name"],
            "Acme Solutions"
        );
    }
}

#[tokio::test]
async fn test_chunk_index_follows_section_not_completion_order() {
    let store = Arc::new(MemoryStore::new());
    let tenant = create_tenant(&store, "Acme").await;
    let stores = Stores {
        knowledge: Arc::new(ReversingKnowledgeStore {
            inner: store.clone(),
        }),
        ..Stores::shared(store.clone())
    };
    let service = service(stores, template_only(), hashed_chain());

    let outcome = service
        .analyze(request(&tenant.id, "https://acme.com"), CancelFlag::new())
        .await
        .unwrap();
    assert_eq!(outcome.chunks_created, 10);

    let chunks = store.chunks_for_tenant(&tenant.id).await.unwrap();
    let stored_order: Vec<u64> = chunks
        .iter()
        .map(|c| c.metadata["chunkIndex"].as_u64().unwrap())
        .collect();
    assert_ne!(stored_order, (0..10).collect::<Vec<u64>>());

    let expected = chunker::sections(&outcome.business_info);
    assert_eq!(expected.len(), 10);
    for chunk in &chunks {
        let index = chunk.metadata["chunkIndex"].as_u64().unwrap() as usize;
        assert_eq!(chunk.content, expected[index].text);
        assert_eq!(chunk.metadata["section"], expected[index].kind.as_str());
    }

    let by_index = |i: u64| {
        chunks
            .iter()
            .find(|c| c.metadata["chunkIndex"] == i)
            .map(|c| c.content.as_str())
            .unwrap()
    };
    assert!(by_index(0).starts_with("Company:"));
    assert!(by_index(4).starts_with("Contact Information:"));
    assert!(by_index(9).starts_with("Target Audience:"));
}

#[tokio::test]
async fn test_store_failures_are_excluded_from_the_count() {
    let store = Arc::new(MemoryStore::new());
    let tenant = create_tenant(&store, "Acme").await;
    let stores = Stores {
        knowledge: Arc::new(FlakyKnowledgeStore {
            inner: store.clone(),
            reject_prefix: "Service:",
        }),
        ..Stores::shared(store.clone())
    };
    let service = service(stores, template_only(), hashed_chain());

    let outcome = service
        .analyze(request(&tenant.id, "https://acme.com"), CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(outcome.chunks_created, 8);
    assert_eq!(store.chunk_count(&tenant.id).await.unwrap(), 8);

    let session = store.get_session(&outcome.session_id).await.unwrap().unwrap();
    assert_eq!(session.chunks_created, 8);
    assert_eq!(session.status, SessionStatus::Completed);
}

#[tokio::test]
async fn test_embedding_failure_still_stores_chunks() {
    let (store, stores) = memory_stores();
    let tenant = create_tenant(&store, "Acme").await;
    let service = service(stores, template_only(), failing_chain());

    let outcome = service
        .analyze(request(&tenant.id, "https://acme.com"), CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(outcome.chunks_created, 10);
    let chunks = store.chunks_for_tenant(&tenant.id).await.unwrap();
    assert!(chunks.iter().all(|c| c.embedding.is_none()));
    assert!(chunks.iter().all(|c| c.metadata["embeddingProvider"].is_null()));
    assert!(chunks.iter().all(|c| c.embedding_provider.is_none()));
}

#[tokio::test]
async fn test_invalid_url_is_rejected_before_any_session() {
    let (store, stores) = memory_stores();
    let tenant = create_tenant(&store, "Acme").await;
    let service = service(stores, template_only(), hashed_chain());

    let err = service
        .analyze(request(&tenant.id, "not-a-url"), CancelFlag::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidRequest(_)));
    assert_eq!(err.http_status(), 400);
    assert!(store.sessions_for_tenant(&tenant.id).await.unwrap().is_empty());
    assert_eq!(store.chunk_count(&tenant.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_fields_are_rejected() {
    let (_store, stores) = memory_stores();
    let service = service(stores, template_only(), hashed_chain());

    let err = service
        .analyze(request("", "https://acme.com"), CancelFlag::new())
        .await
        .unwrap_err();

    match err {
        AppError::InvalidRequest(message) => assert_eq!(message, "Dot ID and URL are required"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_tenant_is_not_found() {
    let (_store, stores) = memory_stores();
    let service = service(stores, template_only(), hashed_chain());

    let err = service
        .analyze(request("missing", "https://acme.com"), CancelFlag::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_total_analyzer_failure_fails_the_session() {
    let (store, stores) = memory_stores();
    let tenant = create_tenant(&store, "Acme").await;
    let analyzers = AnalyzerChain::new(vec![Arc::new(QuotaAnalyzer) as Arc<dyn BusinessAnalyzer>]);
    let service = service(stores, analyzers, hashed_chain());

    let err = service
        .analyze(request(&tenant.id, "https://acme.com"), CancelFlag::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AnalysisFailed(_)));

    let sessions = store.sessions_for_tenant(&tenant.id).await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].status, SessionStatus::Failed);
    assert!(sessions[0]
        .error_message
        .as_deref()
        .unwrap()
        .contains("quota exceeded"));

    let tenant = store.get_tenant(&tenant.id).await.unwrap().unwrap();
    assert_eq!(tenant.setup_status, SetupStatus::Pending);
    assert_eq!(store.chunk_count(&tenant.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_cancelled_run_stores_nothing_new() {
    let (store, stores) = memory_stores();
    let tenant = create_tenant(&store, "Acme").await;
    let service = service(stores, template_only(), hashed_chain());

    let cancel = CancelFlag::new();
    cancel.cancel();
    let outcome = service
        .analyze(request(&tenant.id, "https://acme.com"), cancel)
        .await
        .unwrap();

    assert!(outcome.cancelled);
    assert_eq!(outcome.chunks_created, 0);
    assert_eq!(
        outcome.message,
        "Analysis cancelled after creating 0 knowledge chunks."
    );
    assert_eq!(store.chunk_count(&tenant.id).await.unwrap(), 0);

    let session = store.get_session(&outcome.session_id).await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.chunks_created, 0);
}

#[tokio::test]
async fn test_model_analyzer_output_is_chunked() {
    let (store, stores) = memory_stores();
    let tenant = create_tenant(&store, "Bakery").await;

    let reply = r#"```json
{
  "company": {"name": "Crumb & Co", "description": "Neighbourhood bakery", "industry": "Food"},
  "products": [{"name": "Sourdough", "description": "Slow-fermented loaf", "features": ["organic flour"], "pricing": "$8"}],
  "services": [],
  "contact": {"email": "hello@crumb.test"},
  "faq": [{"question": "Do you deliver?", "answer": "Within five miles."}],
  "keyFeatures": [],
  "targetAudience": ""
}
```"#;
    let client = Arc::new(MockClient::replying(reply));
    let model = ModelAnalyzer::new(
        client.clone(),
        load_builtin(ANALYSIS_BUSINESS).unwrap(),
        &AnalysisSettings::default(),
    );
    let analyzers = AnalyzerChain::new(vec![
        Arc::new(model) as Arc<dyn BusinessAnalyzer>,
        Arc::new(TemplateAnalyzer::new()),
    ]);
    let service = service(stores, analyzers, hashed_chain());

    let outcome = service
        .analyze(
            AnalyzeRequest {
                tenant_id: tenant.id.clone(),
                url: "https://crumb.test".to_string(),
                custom_instructions: Some("Focus on delivery".to_string()),
            },
            CancelFlag::new(),
        )
        .await
        .unwrap();

    assert_eq!(client.calls(), 1);
    assert_eq!(outcome.analyzer, "model");
    assert_eq!(outcome.business_info.company.source_url, "https://crumb.test");
    // company, product, contact, faq
    assert_eq!(outcome.chunks_created, 4);

    let contents: Vec<String> = store
        .chunks_for_tenant(&tenant.id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.content)
        .collect();
    assert!(contents.iter().any(|c| c.contains("Product: Sourdough")));
    assert!(contents.iter().any(|c| c.contains("Q: Do you deliver?")));
}

#[tokio::test]
async fn test_rate_limited_model_falls_back_to_template() {
    let (store, stores) = memory_stores();
    let tenant = create_tenant(&store, "Acme").await;
    let model = ModelAnalyzer::new(
        Arc::new(MockClient::failing(ProviderErrorKind::RateLimited)),
        load_builtin(ANALYSIS_BUSINESS).unwrap(),
        &AnalysisSettings::default(),
    );
    let analyzers = AnalyzerChain::new(vec![
        Arc::new(model) as Arc<dyn BusinessAnalyzer>,
        Arc::new(TemplateAnalyzer::new()),
    ]);
    let service = service(stores, analyzers, hashed_chain());

    let outcome = service
        .analyze(request(&tenant.id, "https://acme.com"), CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(outcome.analyzer, "template");
    assert_eq!(outcome.chunks_created, 10);
}

#[tokio::test]
async fn test_progress_events_cover_every_phase() {
    let (store, stores) = memory_stores();
    let tenant = create_tenant(&store, "Acme").await;

    let events: Arc<Mutex<Vec<ProgressEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let reporter = ProgressReporter::new(Arc::new(move |event| {
        sink.lock().unwrap().push(event);
    }));
    let service = service(stores, template_only(), hashed_chain()).with_progress(reporter);

    service
        .analyze(request(&tenant.id, "https://acme.com"), CancelFlag::new())
        .await
        .unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events[0].phase, "analyze");
    assert!(events[0].message.contains("template"));
    assert_eq!(events[1].phase, "chunk");
    assert_eq!(events[1].current, 10);

    let stores: Vec<&ProgressEvent> = events.iter().filter(|e| e.phase == "store").collect();
    assert_eq!(stores.len(), 10);
    assert!(stores.iter().all(|e| e.total == Some(10)));
    assert_eq!(stores.iter().map(|e| e.current).max(), Some(10));
    assert!(events.iter().all(|e| e.elapsed_secs.is_some()));
}

#[tokio::test]
async fn test_sqlite_store_end_to_end() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(".dot").join("dot.db");

    let tenant_id = {
        let store = Arc::new(SqliteStore::open(&path).unwrap());
        let tenant = store
            .create_tenant(NewTenant {
                name: "Acme".to_string(),
                domain: "acme.com".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let service = service(Stores::shared(store), template_only(), hashed_chain());

        let outcome = service
            .analyze(request(&tenant.id, "https://acme.com"), CancelFlag::new())
            .await
            .unwrap();
        assert_eq!(outcome.chunks_created, 10);
        tenant.id
    };

    let reopened = SqliteStore::open(&path).unwrap();
    let chunks = reopened.chunks_for_tenant(&tenant_id).await.unwrap();
    assert_eq!(chunks.len(), 10);
    assert!(chunks.iter().all(|c| c.embedding.as_ref().map(Vec::len) == Some(DIMS)));

    let tenant = reopened.get_tenant(&tenant_id).await.unwrap().unwrap();
    assert_eq!(tenant.setup_status, SetupStatus::Connected);

    let sessions = reopened.sessions_for_tenant(&tenant_id).await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].status, SessionStatus::Completed);
}
