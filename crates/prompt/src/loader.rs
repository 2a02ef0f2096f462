//! Prompt loader: built-in definitions plus workspace overrides.
//!
//! A file named `<id>.yml` under `.dot/prompts/` replaces the built-in
//! definition with the same id.

use crate::types::PromptDefinition;
use dot_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Prompt used by the response composer.
pub const CHAT_RESPOND: &str = "chat.respond";

/// Prompt used by the model-driven business analyzer.
pub const ANALYSIS_BUSINESS: &str = "analysis.business";

const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    (CHAT_RESPOND, include_str!("../prompts/chat.respond.yml")),
    (ANALYSIS_BUSINESS, include_str!("../prompts/analysis.business.yml")),
];

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(".dot").join("prompts")
}

/// Load a built-in prompt definition.
pub fn load_builtin(prompt_id: &str) -> AppResult<PromptDefinition> {
    let (_, source) = BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Unknown built-in prompt: {}", prompt_id)))?;

    parse_prompt(source, prompt_id)
}

/// Load a prompt definition by ID, preferring a workspace override.
///
/// # Example
/// ```no_run
/// use dot_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "chat.respond")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    if !prompt_file.exists() {
        tracing::debug!(prompt_id, "No workspace override, using built-in prompt");
        return load_builtin(prompt_id);
    }

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition = parse_prompt(&contents, &prompt_file.display().to_string())?;

    if definition.id != prompt_id {
        return Err(AppError::Prompt(format!(
            "Prompt file {:?} declares id '{}', expected '{}'",
            prompt_file, definition.id, prompt_id
        )));
    }

    tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// List all available prompt IDs: built-ins and workspace files, sorted.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let mut prompt_ids: Vec<String> = BUILTIN_PROMPTS
        .iter()
        .map(|(id, _)| id.to_string())
        .collect();

    let dir = prompts_dir(workspace_path);
    if dir.exists() {
        for entry in walkdir::WalkDir::new(&dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    prompt_ids.push(stem.to_string());
                }
            }
        }
    }

    prompt_ids.sort();
    prompt_ids.dedup();
    Ok(prompt_ids)
}

fn parse_prompt(contents: &str, origin: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e)))?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_override(dir: &Path, id: &str, body: &str) {
        let prompts_dir = dir.join(".dot/prompts");
        fs::create_dir_all(&prompts_dir).unwrap();
        fs::write(prompts_dir.join(format!("{}.yml", id)), body).unwrap();
    }

    fn valid_override(id: &str) -> String {
        format!(
            r#"
id: {}
title: "Override"
apiVersion: "1.0"
behavior:
  tone: terse
  style: terse
template: "Q: {{{{message}}}}"
output:
  format: text
"#,
            id
        )
    }

    #[test]
    fn test_builtins_parse() {
        let chat = load_builtin(CHAT_RESPOND).unwrap();
        assert!(chat.system.is_some());
        assert!(chat.input.required.contains(&"message".to_string()));

        let analysis = load_builtin(ANALYSIS_BUSINESS).unwrap();
        assert_eq!(analysis.output.format, "json");
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(load_builtin("nope").is_err());
    }

    #[test]
    fn test_falls_back_to_builtin() {
        let temp_dir = TempDir::new().unwrap();
        let prompt = load_prompt(temp_dir.path(), CHAT_RESPOND).unwrap();
        assert_eq!(prompt.title, "Grounded chat response");
    }

    #[test]
    fn test_workspace_override_wins() {
        let temp_dir = TempDir::new().unwrap();
        write_override(temp_dir.path(), CHAT_RESPOND, &valid_override(CHAT_RESPOND));

        let prompt = load_prompt(temp_dir.path(), CHAT_RESPOND).unwrap();
        assert_eq!(prompt.title, "Override");
        assert_eq!(prompt.template, "Q: {{message}}");
    }

    #[test]
    fn test_override_with_wrong_id_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        write_override(temp_dir.path(), CHAT_RESPOND, &valid_override("other"));
        assert!(load_prompt(temp_dir.path(), CHAT_RESPOND).is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        write_override(temp_dir.path(), "broken", "invalid: yaml: content:");
        assert!(load_prompt(temp_dir.path(), "broken").is_err());
    }

    #[test]
    fn test_list_prompts() {
        let temp_dir = TempDir::new().unwrap();
        write_override(temp_dir.path(), "custom.one", &valid_override("custom.one"));
        write_override(temp_dir.path(), CHAT_RESPOND, &valid_override(CHAT_RESPOND));

        let prompts = list_prompts(temp_dir.path()).unwrap();
        assert_eq!(
            prompts,
            vec![
                ANALYSIS_BUSINESS.to_string(),
                CHAT_RESPOND.to_string(),
                "custom.one".to_string()
            ]
        );
    }
}
