//! Tenant-scoped retrieval: vector ranking with a substring fallback.

use crate::embeddings::{cosine_similarity, Embedded};
use crate::store::KnowledgeStore;
use crate::types::KnowledgeChunk;
use dot_core::{AppResult, RetrievalSettings};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A chunk selected for the prompt context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub content: String,

    /// Cosine similarity to the query; `None` for substring matches.
    pub similarity: Option<f32>,
}

impl RetrievedChunk {
    fn scored(chunk: KnowledgeChunk, similarity: f32) -> Self {
        Self {
            content: chunk.content,
            similarity: Some(similarity),
        }
    }

    fn matched(chunk: KnowledgeChunk) -> Self {
        Self {
            content: chunk.content,
            similarity: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Retriever {
    threshold: f32,
    limit: usize,
}

impl Retriever {
    pub fn new(settings: &RetrievalSettings) -> Self {
        Self {
            threshold: settings.threshold,
            limit: settings.limit,
        }
    }

    /// Configured default result count.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Most relevant chunks of `tenant_id` for `query`, best first.
    ///
    /// With a query embedding, chunks embedded by the same provider are ranked
    /// by cosine similarity and filtered by the threshold. Chunks that cannot
    /// be compared (no embedding, another provider, a different length or a
    /// zero vector) are still reachable through substring matching if slots
    /// remain. Without a usable query embedding only substring matching is
    /// used; an all-zero query vector counts as none.
    pub async fn retrieve(
        &self,
        store: &dyn KnowledgeStore,
        tenant_id: &str,
        query: &str,
        query_embedding: Option<&Embedded>,
        limit: usize,
    ) -> AppResult<Vec<RetrievedChunk>> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = query_embedding.filter(|e| e.vector.iter().any(|x| *x != 0.0));

        if let Some(embedded) = query_embedding {
            if let Some(native) = store
                .similarity_search(
                    tenant_id,
                    &embedded.vector,
                    &embedded.provider,
                    self.threshold,
                    limit,
                )
                .await?
            {
                tracing::debug!(tenant_id, results = native.len(), "Native similarity search");
                return Ok(native
                    .into_iter()
                    .filter(|s| s.chunk.tenant_id == tenant_id)
                    .take(limit)
                    .map(|s| RetrievedChunk::scored(s.chunk, s.similarity))
                    .collect());
            }
        }

        let chunks = store.chunks_for_tenant(tenant_id).await?;

        let results = match query_embedding {
            Some(embedding) => self.rank(chunks, query, embedding, limit),
            None => substring_matches(chunks, query, limit),
        };

        tracing::debug!(
            tenant_id,
            results = results.len(),
            vector = query_embedding.is_some(),
            "Retrieved chunks"
        );
        Ok(results)
    }

    fn rank(
        &self,
        chunks: Vec<KnowledgeChunk>,
        query: &str,
        embedded: &Embedded,
        limit: usize,
    ) -> Vec<RetrievedChunk> {
        let mut scored = Vec::new();
        let mut uncomparable = Vec::new();

        for chunk in chunks {
            let similarity = chunk
                .embedding
                .as_deref()
                .filter(|_| chunk.embedding_provider.as_deref() == Some(embedded.provider.as_str()))
                .and_then(|stored| cosine_similarity(&embedded.vector, stored));
            match similarity {
                Some(sim) => {
                    if sim >= self.threshold {
                        scored.push((chunk, sim));
                    }
                }
                None => uncomparable.push(chunk),
            }
        }

        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(limit);

        let mut results: Vec<RetrievedChunk> = scored
            .into_iter()
            .map(|(chunk, sim)| RetrievedChunk::scored(chunk, sim))
            .collect();

        let remaining = limit - results.len();
        if remaining > 0 && !uncomparable.is_empty() {
            results.extend(substring_matches(uncomparable, query, remaining));
        }
        results
    }
}

/// Case-insensitive containment in store order.
fn substring_matches(chunks: Vec<KnowledgeChunk>, query: &str, limit: usize) -> Vec<RetrievedChunk> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    chunks
        .into_iter()
        .filter(|chunk| chunk.content.to_lowercase().contains(&needle))
        .take(limit)
        .map(RetrievedChunk::matched)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashedBagProvider;
    use crate::store::{MemoryStore, ScoredChunk, TenantStore};
    use crate::types::{NewChunk, NewTenant, SourceType};

    fn settings(threshold: f32, limit: usize) -> RetrievalSettings {
        RetrievalSettings {
            threshold,
            limit,
            ..Default::default()
        }
    }

    /// A unit vector at cosine `sim` from `[1, 0]`.
    fn at(sim: f32) -> Vec<f32> {
        vec![sim, (1.0 - sim * sim).sqrt()]
    }

    async fn tenant(store: &MemoryStore) -> String {
        store
            .create_tenant(NewTenant {
                name: "acme".to_string(),
                domain: "acme.test".to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    const PROVIDER: &str = "primary";

    fn query(vector: &[f32]) -> Embedded {
        Embedded {
            vector: vector.to_vec(),
            provider: PROVIDER.to_string(),
        }
    }

    async fn insert_from(
        store: &MemoryStore,
        tenant_id: &str,
        content: &str,
        embedding: Option<Vec<f32>>,
        provider: &str,
    ) {
        store
            .insert_chunk(NewChunk {
                tenant_id: tenant_id.to_string(),
                content: content.to_string(),
                source_type: SourceType::Analysis,
                source_url: String::new(),
                embedding_provider: embedding.as_ref().map(|_| provider.to_string()),
                embedding,
                metadata: serde_json::Value::Null,
            })
            .await
            .unwrap();
    }

    async fn insert(store: &MemoryStore, tenant_id: &str, content: &str, embedding: Option<Vec<f32>>) {
        insert_from(store, tenant_id, content, embedding, PROVIDER).await;
    }

    fn contents(results: &[RetrievedChunk]) -> Vec<&str> {
        results.iter().map(|r| r.content.as_str()).collect()
    }

    #[tokio::test]
    async fn test_threshold_filters_low_scores() {
        let store = MemoryStore::new();
        let t = tenant(&store).await;
        insert(&store, &t, "close", Some(at(0.9))).await;
        insert(&store, &t, "far", Some(at(0.5))).await;

        let retriever = Retriever::new(&settings(0.7, 5));
        let results = retriever
            .retrieve(&store, &t, "anything", Some(&query(&[1.0, 0.0])), 5)
            .await
            .unwrap();

        assert_eq!(contents(&results), vec!["close"]);
        assert!((results[0].similarity.unwrap() - 0.9).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_ranked_descending_with_stable_ties() {
        let store = MemoryStore::new();
        let t = tenant(&store).await;
        insert(&store, &t, "tie-a", Some(at(0.8))).await;
        insert(&store, &t, "best", Some(at(0.95))).await;
        insert(&store, &t, "tie-b", Some(at(0.8))).await;

        let retriever = Retriever::new(&settings(0.7, 5));
        let results = retriever
            .retrieve(&store, &t, "q", Some(&query(&[1.0, 0.0])), 2)
            .await
            .unwrap();

        assert_eq!(contents(&results), vec!["best", "tie-a"]);
    }

    #[tokio::test]
    async fn test_uncomparable_chunks_use_substring() {
        let store = MemoryStore::new();
        let t = tenant(&store).await;
        insert(&store, &t, "Pricing: contact us", Some(vec![1.0, 0.0, 0.0])).await;
        insert(&store, &t, "Our PRICING page", None).await;
        insert(&store, &t, "vector hit", Some(at(0.99))).await;

        let retriever = Retriever::new(&settings(0.7, 5));
        let results = retriever
            .retrieve(&store, &t, "pricing", Some(&query(&[1.0, 0.0])), 5)
            .await
            .unwrap();

        assert_eq!(
            contents(&results),
            vec!["vector hit", "Pricing: contact us", "Our PRICING page"]
        );
        assert!(results[1].similarity.is_none());
    }

    #[tokio::test]
    async fn test_substring_without_embedding() {
        let store = MemoryStore::new();
        let t = tenant(&store).await;
        insert(&store, &t, "Pricing: $10", None).await;
        insert(&store, &t, "Support hours", None).await;
        insert(&store, &t, "Enterprise pricing on request", None).await;

        let retriever = Retriever::new(&settings(0.7, 5));
        let results = retriever.retrieve(&store, &t, "pricing", None, 5).await.unwrap();
        assert_eq!(
            contents(&results),
            vec!["Pricing: $10", "Enterprise pricing on request"]
        );

        let limited = retriever.retrieve(&store, &t, "pricing", None, 1).await.unwrap();
        assert_eq!(contents(&limited), vec!["Pricing: $10"]);
    }

    #[tokio::test]
    async fn test_empty_query_returns_nothing() {
        let store = MemoryStore::new();
        let t = tenant(&store).await;
        insert(&store, &t, "Anything at all", None).await;

        let retriever = Retriever::new(&RetrievalSettings::default());
        assert!(retriever.retrieve(&store, &t, "   ", None, 5).await.unwrap().is_empty());
        assert!(retriever.retrieve(&store, &t, "", Some(&query(&[1.0])), 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tenant_isolation() {
        let store = MemoryStore::new();
        let a = tenant(&store).await;
        let b = tenant(&store).await;
        insert(&store, &a, "secret pricing", Some(at(1.0))).await;

        let retriever = Retriever::new(&RetrievalSettings::default());
        let vector = retriever
            .retrieve(&store, &b, "secret pricing", Some(&query(&[1.0, 0.0])), 5)
            .await
            .unwrap();
        let substring = retriever
            .retrieve(&store, &b, "secret pricing", None, 5)
            .await
            .unwrap();
        assert!(vector.is_empty());
        assert!(substring.is_empty());
    }

    #[tokio::test]
    async fn test_other_provider_vectors_use_substring() {
        let store = MemoryStore::new();
        let t = tenant(&store).await;
        let dense: Vec<f32> = (0..1536).map(|i| ((i % 7) as f32 + 1.0) / 7.0).collect();
        insert_from(&store, &t, "Pricing: $10 per month", Some(dense), "openai").await;
        insert_from(&store, &t, "Support hours", Some(vec![0.5; 1536]), "openai").await;

        let fallback = HashedBagProvider::new(1536);
        let embedded = Embedded {
            vector: fallback.embed_text("pricing"),
            provider: "hashed".to_string(),
        };

        let retriever = Retriever::new(&settings(0.7, 5));
        let results = retriever
            .retrieve(&store, &t, "pricing", Some(&embedded), 5)
            .await
            .unwrap();
        assert_eq!(contents(&results), vec!["Pricing: $10 per month"]);
        assert!(results[0].similarity.is_none());
    }

    #[tokio::test]
    async fn test_zero_query_vector_uses_substring() {
        let store = MemoryStore::new();
        let t = tenant(&store).await;
        insert(&store, &t, "AI? Yes, our assistant answers", Some(at(0.9))).await;
        insert(&store, &t, "Unrelated", Some(at(0.95))).await;

        // "AI?" has no token long enough to hash.
        let embedded = Embedded {
            vector: HashedBagProvider::new(2).embed_text("AI?"),
            provider: PROVIDER.to_string(),
        };
        assert!(embedded.vector.iter().all(|x| *x == 0.0));

        let retriever = Retriever::new(&settings(0.7, 5));
        let results = retriever
            .retrieve(&store, &t, "AI?", Some(&embedded), 5)
            .await
            .unwrap();
        assert_eq!(contents(&results), vec!["AI? Yes, our assistant answers"]);
    }

    struct NativeStore;

    #[async_trait::async_trait]
    impl KnowledgeStore for NativeStore {
        async fn insert_chunk(&self, _chunk: NewChunk) -> AppResult<String> {
            unreachable!()
        }

        async fn chunks_for_tenant(&self, _tenant_id: &str) -> AppResult<Vec<KnowledgeChunk>> {
            panic!("native search should be preferred");
        }

        async fn similarity_search(
            &self,
            tenant_id: &str,
            _query: &[f32],
            _provider: &str,
            _threshold: f32,
            _limit: usize,
        ) -> AppResult<Option<Vec<ScoredChunk>>> {
            let chunk = KnowledgeChunk {
                id: "1".to_string(),
                tenant_id: tenant_id.to_string(),
                content: "from the database".to_string(),
                source_type: SourceType::Analysis,
                source_url: String::new(),
                embedding: None,
                embedding_provider: None,
                metadata: serde_json::Value::Null,
                created_at: chrono::Utc::now(),
            };
            Ok(Some(vec![ScoredChunk {
                chunk,
                similarity: 0.88,
            }]))
        }

        async fn chunk_count(&self, _tenant_id: &str) -> AppResult<usize> {
            Ok(1)
        }
    }

    #[tokio::test]
    async fn test_native_similarity_search_preferred() {
        let retriever = Retriever::new(&RetrievalSettings::default());
        let results = retriever
            .retrieve(&NativeStore, "t1", "q", Some(&query(&[1.0, 0.0])), 5)
            .await
            .unwrap();
        assert_eq!(contents(&results), vec!["from the database"]);
        assert_eq!(results[0].similarity, Some(0.88));
    }
}
