//! Stats command handler.

use super::print_json;
use clap::Args;
use dot_core::{config::AppConfig, AppResult};
use dot_knowledge::{tenant_stats, ServiceSet};

/// Show knowledge base statistics for a dot
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Dot ID
    pub tenant: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let services = ServiceSet::from_config(config)?;
        let stats = tenant_stats(&services.stores, &self.tenant).await?;

        if self.json {
            return print_json(&stats);
        }

        println!("Dot: {} ({})", stats.tenant.name, stats.tenant.id);
        println!("  Status: {}", stats.tenant.setup_status.as_str());
        println!(
            "  Chunks: {} ({} with embeddings)",
            stats.chunks, stats.embedded_chunks
        );
        println!("  Analysis sessions: {}", stats.sessions);
        if let Some(last) = &stats.last_session {
            println!(
                "  Last session: {} {} ({} chunks)",
                last.status, last.url, last.chunks_created
            );
        }
        println!("  Conversations: {}", stats.conversations);
        Ok(())
    }
}
