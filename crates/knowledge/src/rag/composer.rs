//! Response composition with layered fallbacks.

use super::canned::canned_response;
use super::demo::DEMO_DESCRIPTION;
use super::Persona;
use dot_core::{AppError, AppResult, ChatSettings, ProviderErrorKind};
use dot_llm::{with_deadline, ChatMessage, LlmClient, LlmRequest};
use dot_prompt::{build_prompt, PromptDefinition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// How a response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Generated,
    Canned,
    Excerpt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedResponse {
    pub text: String,
    pub source: ResponseSource,
}

/// Inputs for one composition. `chunks` are ordered most relevant first.
#[derive(Debug, Clone, Copy)]
pub struct ComposeRequest<'a> {
    pub message: &'a str,
    pub persona: &'a Persona,
    pub chunks: &'a [String],
    pub history: &'a [ChatMessage],
}

pub struct ResponseComposer {
    client: Option<Arc<dyn LlmClient>>,
    prompt: PromptDefinition,
    history_turns: usize,
    excerpt_chars: usize,
    timeout: Duration,
}

impl ResponseComposer {
    /// `client` is `None` when no generation provider is configured; every
    /// composition then takes the fallback path.
    pub fn new(
        client: Option<Arc<dyn LlmClient>>,
        prompt: PromptDefinition,
        chat: &ChatSettings,
        history_turns: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            prompt,
            history_turns,
            excerpt_chars: chat.excerpt_chars,
            timeout,
        }
    }

    /// Compose an answer. Never fails and never returns empty text.
    pub async fn compose(&self, request: ComposeRequest<'_>) -> ComposedResponse {
        match self.generate(&request).await {
            Ok(text) => ComposedResponse {
                text,
                source: ResponseSource::Generated,
            },
            Err(e) => self.fallback(&request, &e),
        }
    }

    #[tracing::instrument(skip_all, fields(persona = %request.persona.name, chunks = request.chunks.len()))]
    async fn generate(&self, request: &ComposeRequest<'_>) -> AppResult<String> {
        let client = self.client.as_ref().ok_or_else(|| {
            AppError::provider(
                "none",
                ProviderErrorKind::Other,
                "no generation provider configured",
            )
        })?;

        let built = build_prompt(&self.prompt, self.variables(request))?;

        let mut llm_request = LlmRequest::new(built.user, &request.persona.model)
            .with_temperature(request.persona.temperature)
            .with_max_tokens(request.persona.max_tokens);
        if let Some(system) = built.system {
            llm_request = llm_request.with_system(system);
        }

        let provider = client.provider_name();
        let response =
            with_deadline(provider, self.timeout, client.complete(&llm_request)).await?;

        let text = response.content.trim();
        if text.is_empty() {
            return Err(AppError::provider(
                provider,
                ProviderErrorKind::Other,
                "provider returned an empty completion",
            ));
        }

        tracing::debug!(provider, model = %response.model, "Generated response");
        Ok(text.to_string())
    }

    fn variables(&self, request: &ComposeRequest<'_>) -> HashMap<String, String> {
        let persona = request.persona;
        let mut vars = HashMap::new();
        vars.insert("personaName".to_string(), persona.name.clone());
        vars.insert("message".to_string(), request.message.to_string());

        if persona.is_demo() {
            vars.insert("demoDescription".to_string(), DEMO_DESCRIPTION.to_string());
        } else if let Some(context) = &persona.context {
            vars.insert("businessContext".to_string(), context.clone());
        }

        if !request.chunks.is_empty() {
            vars.insert("context".to_string(), request.chunks.join("\n\n"));
        }

        let start = request.history.len().saturating_sub(self.history_turns);
        let history = request.history[start..]
            .iter()
            .map(|turn| format!("{}: {}", turn.role.as_str(), turn.content))
            .collect::<Vec<_>>()
            .join("\n");
        if !history.is_empty() {
            vars.insert("history".to_string(), history);
        }

        vars
    }

    fn fallback(&self, request: &ComposeRequest<'_>, err: &AppError) -> ComposedResponse {
        let rate_limited = err.provider_kind() == Some(ProviderErrorKind::RateLimited);
        tracing::warn!(error = %err, rate_limited, "Generation failed, using fallback response");

        if !rate_limited {
            if let Some(best) = request.chunks.first().filter(|c| !c.trim().is_empty()) {
                let excerpt: String = best.chars().take(self.excerpt_chars).collect();
                return ComposedResponse {
                    text: format!("Based on the information I have: {}...", excerpt),
                    source: ResponseSource::Excerpt,
                };
            }
        }

        ComposedResponse {
            text: canned_response(request.message, request.persona.is_demo()).to_string(),
            source: ResponseSource::Canned,
        }
    }
}
