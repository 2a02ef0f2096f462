//! Prompt builder for rendering system and user templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use dot_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Required variables (`input.required`) must be present and non-blank.
/// Both templates are rendered without HTML escaping; runs of blank lines
/// left behind by skipped `{{#if}}` blocks are collapsed.
///
/// # Example
/// ```no_run
/// use dot_prompt::{build_prompt, load_builtin};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = load_builtin("chat.respond")?;
/// let mut vars = HashMap::new();
/// vars.insert("personaName".to_string(), "Acme".to_string());
/// vars.insert("message".to_string(), "Do you ship to Canada?".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("System: {:?}", built.system);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    for name in &definition.input.required {
        let present = variables
            .get(name)
            .map(|value| !value.trim().is_empty())
            .unwrap_or(false);
        if !present {
            return Err(AppError::Prompt(format!(
                "Prompt '{}' requires variable '{}'",
                definition.id, name
            )));
        }
    }

    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    let system = match &definition.system {
        Some(template) => {
            let rendered = tidy(&render(&mut handlebars, "system", template, &variables)?);
            if rendered.is_empty() {
                None
            } else {
                Some(rendered)
            }
        }
        None => None,
    };

    let user = tidy(&render(
        &mut handlebars,
        "user",
        &definition.template,
        &variables,
    )?);

    Ok(BuiltPrompt::new(system, user, definition, variables))
}

/// Render a Handlebars template with variables.
fn render(
    handlebars: &mut Handlebars<'_>,
    name: &str,
    template: &str,
    variables: &HashMap<String, String>,
) -> AppResult<String> {
    handlebars
        .register_template_string(name, template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render(name, variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

/// Trim trailing whitespace per line and keep at most one blank line in a row.
fn tidy(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim_end) {
        if line.is_empty() && out.last().map_or(true, |prev| prev.is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.last().is_some_and(|line| line.is_empty()) {
        out.pop();
    }
    out.join("\n")
}
