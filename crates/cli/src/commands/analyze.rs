//! Analyze command handler.
//!
//! Runs the analysis pipeline for one dot and URL, printing progress to
//! stderr. Ctrl-C stops new chunks from being dispatched; chunks already
//! in flight are stored and the partial result is reported.

use super::print_json;
use clap::Args;
use dot_core::{config::AppConfig, AppResult};
use dot_knowledge::{
    AnalyzeRequest, AnalyzeResponse, CancelFlag, ProgressEvent, ProgressReporter, ServiceSet,
};
use std::sync::Arc;

/// Analyze a website into a dot's knowledge base
#[derive(Args, Debug)]
pub struct AnalyzeCommand {
    /// Dot ID
    pub tenant: String,

    /// Website URL (http or https)
    pub url: String,

    /// Extra focus for the analyzer
    #[arg(short, long)]
    pub instructions: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AnalyzeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let services = ServiceSet::from_config(config)?;

        let reporter = ProgressReporter::new(Arc::new(|event: ProgressEvent| {
            eprintln!("{}", event.format_simple());
        }));
        let analysis = services.analysis.with_progress(reporter);

        let cancel = CancelFlag::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("Interrupted, finishing chunks already in flight...");
                    cancel.cancel();
                }
            })
        };

        let request = AnalyzeRequest {
            tenant_id: self.tenant.clone(),
            url: self.url.clone(),
            custom_instructions: self.instructions.clone(),
        };
        let result = analysis.analyze(request, cancel).await;
        watcher.abort();
        let outcome = result?;

        tracing::debug!(analyzer = %outcome.analyzer, "Analysis finished");

        if self.json {
            return print_json(&AnalyzeResponse::from(outcome));
        }

        println!("{}", outcome.message);
        println!("  Session: {}", outcome.session_id);
        println!("  Company: {}", outcome.business_info.company.name);
        println!("  Analyzer: {}", outcome.analyzer);
        Ok(())
    }
}
