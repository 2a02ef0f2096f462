//! Chat command handler.

use super::print_json;
use clap::Args;
use dot_core::{config::AppConfig, AppResult};
use dot_knowledge::{ChatRequest, ChatResponse, ServiceSet};

/// Send one chat message to a dot
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Dot ID ("demo" for the built-in demonstration assistant)
    pub tenant: String,

    /// Visitor message
    pub message: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let services = ServiceSet::from_config(config)?;

        let reply = services
            .chat
            .chat(ChatRequest {
                tenant_id: self.tenant.clone(),
                message: self.message.clone(),
                history: Vec::new(),
            })
            .await?;

        tracing::debug!(source = ?reply.source, chunks = reply.relevant_chunks_used, "Reply composed");

        if self.json {
            return print_json(&ChatResponse::from(reply));
        }

        println!("{}", reply.response);
        Ok(())
    }
}
