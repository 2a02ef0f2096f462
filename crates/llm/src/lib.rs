//! Generation provider crate for Dot.
//!
//! A provider-agnostic chat-completion abstraction. Every client reports
//! failures as `AppError::ProviderUnavailable` carrying a
//! `ProviderErrorKind`, which is what the response composer and the
//! business analyzer branch on.
//!
//! # Providers
//! - **OpenAI**: hosted chat completions (default)
//! - **Ollama**: local runtime
//! - **Mock**: scripted replies or failures
//!
//! # Example
//! ```no_run
//! use dot_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod client;
pub mod deadline;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{ChatMessage, ChatRole, LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use deadline::with_deadline;
pub use factory::create_client;
pub use providers::{MockClient, OllamaClient, OpenAiClient};
pub use types::ProviderType;
