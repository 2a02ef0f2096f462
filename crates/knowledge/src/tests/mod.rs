//! Cross-module scenarios for the analysis and chat pipelines.

mod analysis_pipeline;
mod support;
