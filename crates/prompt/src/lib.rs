//! Prompt system for Dot.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions with built-in defaults
//! - Workspace overrides under `.dot/prompts/`
//! - Handlebars rendering of system and user templates

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{list_prompts, load_builtin, load_prompt, ANALYSIS_BUSINESS, CHAT_RESPOND};
pub use types::{
    BuiltPrompt, BuiltPromptMetadata, PromptBehavior, PromptDefinition, PromptInputSpec,
    PromptOutputSpec,
};
