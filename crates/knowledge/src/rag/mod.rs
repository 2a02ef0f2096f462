//! Grounded response composition.
//!
//! The composer turns a message, the tenant persona, retrieved chunks and
//! recent history into an answer. Generation failures degrade to an excerpt
//! of the best chunk or a canned reply; the composer itself never fails.

pub mod canned;
pub mod composer;
pub mod demo;

pub use canned::canned_response;
pub use composer::{ComposeRequest, ComposedResponse, ResponseComposer, ResponseSource};
pub use demo::{demo_knowledge, demo_persona, DEMO_TENANT_ID};

use crate::types::Tenant;
use dot_core::{ChatSettings, LlmSettings};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaKind {
    Tenant,
    Demo,
}

/// Who the assistant speaks for, and with which model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub name: String,
    pub context: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub kind: PersonaKind,
}

impl Persona {
    /// Persona of a registered tenant; unset fields fall back to configuration.
    pub fn for_tenant(tenant: &Tenant, llm: &LlmSettings, chat: &ChatSettings) -> Self {
        let name = match tenant.name.trim() {
            "" => "this business".to_string(),
            name => name.to_string(),
        };

        Self {
            name,
            context: tenant
                .business_context
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            model: tenant
                .ai_model
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| llm.model.clone()),
            temperature: tenant.temperature.unwrap_or(chat.default_temperature),
            max_tokens: tenant.max_tokens.unwrap_or(chat.default_max_tokens),
            kind: PersonaKind::Tenant,
        }
    }

    pub fn is_demo(&self) -> bool {
        self.kind == PersonaKind::Demo
    }
}
