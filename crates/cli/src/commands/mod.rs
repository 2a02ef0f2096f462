//! Command handlers for the Dot CLI.

pub mod analyze;
pub mod chat;
pub mod prompts;
pub mod serve;
pub mod stats;
pub mod tenant;

pub use analyze::AnalyzeCommand;
pub use chat::ChatCommand;
pub use prompts::PromptsCommand;
pub use serve::ServeCommand;
pub use stats::StatsCommand;
pub use tenant::TenantCommand;

use dot_core::AppResult;
use serde::Serialize;

/// Pretty-printed JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
