//! Business-content analysis: URL in, `BusinessInfo` out.
//!
//! The model-driven analyzer runs first; the template analyzer is the
//! fallback that cannot fail.

pub mod model;
pub mod template;

pub use crate::types::BusinessInfo;
pub use model::ModelAnalyzer;
pub use template::TemplateAnalyzer;

use dot_core::{AppError, AppResult};
use std::sync::Arc;

/// One strategy for turning a URL into business knowledge.
///
/// Failures are always `AppError::AnalysisFailed`.
#[async_trait::async_trait]
pub trait BusinessAnalyzer: Send + Sync {
    fn name(&self) -> &str;

    async fn analyze(&self, url: &str, custom_instructions: Option<&str>) -> AppResult<BusinessInfo>;
}

/// Analyzers tried in order until one succeeds.
#[derive(Clone)]
pub struct AnalyzerChain {
    analyzers: Vec<Arc<dyn BusinessAnalyzer>>,
}

impl AnalyzerChain {
    pub fn new(analyzers: Vec<Arc<dyn BusinessAnalyzer>>) -> Self {
        Self { analyzers }
    }

    pub fn names(&self) -> Vec<&str> {
        self.analyzers.iter().map(|a| a.name()).collect()
    }

    /// Returns the first successful result and the name of the analyzer that produced it.
    pub async fn analyze(
        &self,
        url: &str,
        custom_instructions: Option<&str>,
    ) -> AppResult<(BusinessInfo, String)> {
        let mut reasons = Vec::new();

        for analyzer in &self.analyzers {
            match analyzer.analyze(url, custom_instructions).await {
                Ok(info) => return Ok((info, analyzer.name().to_string())),
                Err(e) => {
                    tracing::warn!(analyzer = analyzer.name(), error = %e, "Analyzer failed, trying next");
                    reasons.push(format!("{}: {}", analyzer.name(), e));
                }
            }
        }

        if reasons.is_empty() {
            return Err(AppError::AnalysisFailed("no analyzers configured".to_string()));
        }
        Err(AppError::AnalysisFailed(reasons.join("; ")))
    }
}
