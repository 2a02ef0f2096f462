//! Embedding provider implementations.

pub mod hashed;
pub mod openai;

pub use hashed::HashedBagProvider;
pub use openai::OpenAiEmbeddingProvider;
