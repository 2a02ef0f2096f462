//! Prompts command handler.

use super::print_json;
use clap::Args;
use dot_core::{config::AppConfig, AppResult};
use dot_prompt::{list_prompts, load_prompt};
use serde::Serialize;

/// List prompt templates, marking workspace overrides
#[derive(Args, Debug)]
pub struct PromptsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// One prompt as shown by `dot prompts`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRow {
    pub id: String,
    #[serde(rename = "override")]
    pub overridden: bool,
    pub title: String,
    pub tone: String,
    pub style: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub created_by: String,
    /// Load error for an unusable override file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PromptsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let rows = prompt_rows(config)?;

        if self.json {
            return print_json(&rows);
        }

        for row in &rows {
            let origin = if row.overridden { "workspace" } else { "built-in" };
            match &row.error {
                Some(error) => println!("{:<20} {:<10} (invalid: {})", row.id, origin, error),
                None => println!(
                    "{:<20} {:<10} {} [{}, {}]",
                    row.id, origin, row.title, row.tone, row.style
                ),
            }
        }
        Ok(())
    }
}

pub fn prompt_rows(config: &AppConfig) -> AppResult<Vec<PromptRow>> {
    let overrides = config.prompts_dir();
    let mut rows = Vec::new();

    for id in list_prompts(&config.workspace)? {
        let overridden = overrides.join(format!("{}.yml", id)).exists();
        let row = match load_prompt(&config.workspace, &id) {
            Ok(prompt) => PromptRow {
                id,
                overridden,
                title: prompt.title,
                tone: prompt.behavior.tone,
                style: prompt.behavior.style,
                created_by: prompt.created_by,
                error: None,
            },
            Err(e) => {
                tracing::warn!(prompt_id = %id, error = %e, "Unusable prompt file");
                PromptRow {
                    id,
                    overridden,
                    title: String::new(),
                    tone: String::new(),
                    style: String::new(),
                    created_by: String::new(),
                    error: Some(e.to_string()),
                }
            }
        };
        rows.push(row);
    }
    Ok(rows)
}
