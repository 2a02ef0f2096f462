//! Embedding providers and the fallback chain.
//!
//! The hosted provider is tried first; the local hashed provider keeps
//! ingestion and retrieval working when it is unavailable. Both produce
//! vectors of the one configured dimension.

pub mod chain;
pub mod provider;
pub mod providers;

pub use chain::{Embedded, EmbeddingChain};
pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{HashedBagProvider, OpenAiEmbeddingProvider};

/// Cosine similarity of two vectors.
///
/// `None` when either vector is empty, their lengths differ or either norm
/// is zero: such a pair is not comparable and must not produce a score.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.is_empty() || a.len() != b.len() {
        return None;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    Some(dot / (norm_a * norm_b))
}
