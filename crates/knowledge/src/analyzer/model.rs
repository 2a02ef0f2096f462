//! Model-driven business analyzer.

use super::BusinessAnalyzer;
use crate::types::BusinessInfo;
use dot_core::{AnalysisSettings, AppError, AppResult, ProviderErrorKind};
use dot_llm::{with_deadline, LlmClient, LlmRequest};
use dot_prompt::{build_prompt, PromptDefinition};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Asks a generation provider to describe the business behind a URL as JSON.
pub struct ModelAnalyzer {
    client: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl ModelAnalyzer {
    pub fn new(client: Arc<dyn LlmClient>, prompt: PromptDefinition, settings: &AnalysisSettings) -> Self {
        Self {
            client,
            prompt,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    fn build_request(&self, url: &str, custom_instructions: Option<&str>) -> AppResult<LlmRequest> {
        let mut vars = HashMap::new();
        vars.insert("url".to_string(), url.to_string());
        if let Some(instructions) = custom_instructions.map(str::trim).filter(|s| !s.is_empty()) {
            vars.insert("instructions".to_string(), instructions.to_string());
        }

        let built = build_prompt(&self.prompt, vars)
            .map_err(|e| AppError::AnalysisFailed(format!("could not build analysis prompt: {}", e)))?;

        let mut request = LlmRequest::new(built.user, &self.model)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        Ok(request)
    }
}

#[async_trait::async_trait]
impl BusinessAnalyzer for ModelAnalyzer {
    fn name(&self) -> &str {
        "model"
    }

    #[tracing::instrument(skip(self, custom_instructions), fields(provider = self.client.provider_name()))]
    async fn analyze(&self, url: &str, custom_instructions: Option<&str>) -> AppResult<BusinessInfo> {
        let request = self.build_request(url, custom_instructions)?;

        let response = with_deadline(
            self.client.provider_name(),
            self.timeout,
            self.client.complete(&request),
        )
        .await
        .map_err(|e| AppError::AnalysisFailed(describe_provider_failure(&e)))?;

        tracing::info!(url, "Model analysis completed");
        parse_business_info(&response.content, url)
    }
}

/// Human-readable reason for a failed provider call.
fn describe_provider_failure(err: &AppError) -> String {
    match err.provider_kind() {
        Some(ProviderErrorKind::RateLimited) => {
            "quota exceeded; check billing or try again later".to_string()
        }
        Some(ProviderErrorKind::Authentication) => "invalid API key".to_string(),
        Some(ProviderErrorKind::ModelUnavailable) => "model not available".to_string(),
        Some(ProviderErrorKind::Timeout) => "timed out".to_string(),
        _ => format!("failed to analyze website: {}", err),
    }
}

/// Parse and validate model output into a `BusinessInfo` for `url`.
pub fn parse_business_info(content: &str, url: &str) -> AppResult<BusinessInfo> {
    let json = extract_json(content)
        .ok_or_else(|| AppError::AnalysisFailed("response contained no JSON object".to_string()))?;

    let mut info: BusinessInfo = serde_json::from_str(json).map_err(|e| {
        AppError::AnalysisFailed(format!("response does not match the business schema: {}", e))
    })?;

    if info.company.name.trim().is_empty() {
        return Err(AppError::AnalysisFailed(
            "response is missing the company name".to_string(),
        ));
    }

    info.company.source_url = url.to_string();
    info.products.retain(|p| !p.name.trim().is_empty());
    info.services.retain(|s| !s.name.trim().is_empty());
    info.faq
        .retain(|f| !f.question.trim().is_empty() && !f.answer.trim().is_empty());

    Ok(info)
}

/// Strip Markdown fences and any prose around the outermost JSON object.
fn extract_json(content: &str) -> Option<&str> {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```"))
        .unwrap_or(trimmed)
        .trim();

    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    (start < end).then(|| &unfenced[start..=end])
}
