//! Bag-of-hashed-words embedding provider.

use crate::embeddings::provider::EmbeddingProvider;
use dot_core::AppResult;

/// Local, offline embedding provider.
///
/// Every token longer than two characters increments one bucket chosen by
/// a stable string hash; the result is L2-normalized. Texts sharing
/// distinctive words score closer under cosine similarity, but there is no
/// semantic generalization, so this is strictly a degraded-mode stand-in
/// for a learned embedding.
#[derive(Debug)]
pub struct HashedBagProvider {
    dimensions: usize,
}

impl HashedBagProvider {
    /// Create a new provider with the given vector length.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    /// Embed one text.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        for token in tokenize(text) {
            let bucket = stable_hash(&token).unsigned_abs() as usize % self.dimensions;
            embedding[bucket] += 1.0;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

/// Lowercase, replace punctuation with spaces, keep tokens longer than two characters.
fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|token| token.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

/// 32-bit wrapping `h * 31 + unit` over UTF-16 code units.
fn stable_hash(token: &str) -> i32 {
    token
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32))
}

#[async_trait::async_trait]
impl EmbeddingProvider for HashedBagProvider {
    fn provider_name(&self) -> &str {
        "hashed"
    }

    fn model_name(&self) -> &str {
        "hashed-bag-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}
