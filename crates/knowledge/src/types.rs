//! Knowledge system type definitions.
//!
//! Records shared by the analyzer, chunker, stores and orchestrators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Treat an explicit JSON `null` like a missing field.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Structured extraction result for one analyzed URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessInfo {
    #[serde(default, deserialize_with = "null_default")]
    pub company: CompanyInfo,

    #[serde(default, deserialize_with = "null_default")]
    pub products: Vec<Product>,

    #[serde(default, deserialize_with = "null_default")]
    pub services: Vec<Service>,

    #[serde(default, deserialize_with = "null_default")]
    pub contact: ContactInfo,

    #[serde(default, deserialize_with = "null_default")]
    pub faq: Vec<FaqEntry>,

    #[serde(default, deserialize_with = "null_default")]
    pub key_features: Vec<String>,

    #[serde(default, deserialize_with = "null_default")]
    pub target_audience: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_default")]
    pub description: String,

    #[serde(default, deserialize_with = "null_default")]
    pub industry: String,

    /// Always the analyzed URL, whatever the analyzer reported.
    #[serde(default, alias = "website", deserialize_with = "null_default")]
    pub source_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_default")]
    pub description: String,

    #[serde(default, deserialize_with = "null_default")]
    pub features: Vec<String>,

    #[serde(default)]
    pub pricing: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_default")]
    pub description: String,

    #[serde(default, deserialize_with = "null_default")]
    pub benefits: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub address: Option<String>,

    #[serde(default, alias = "social", deserialize_with = "null_default")]
    pub social_links: Vec<String>,
}

impl ContactInfo {
    /// True when at least one field carries a value.
    pub fn has_any(&self) -> bool {
        let filled = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.trim().is_empty());
        filled(&self.email)
            || filled(&self.phone)
            || filled(&self.address)
            || self.social_links.iter().any(|link| !link.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaqEntry {
    #[serde(default, deserialize_with = "null_default")]
    pub question: String,

    #[serde(default, deserialize_with = "null_default")]
    pub answer: String,
}

/// Origin of a knowledge chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType {
    Analysis,
    ManualFaq,
    Scrape,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analysis => "analysis",
            Self::ManualFaq => "manual-faq",
            Self::Scrape => "scrape",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "analysis" => Some(Self::Analysis),
            "manual-faq" => Some(Self::ManualFaq),
            "scrape" => Some(Self::Scrape),
            _ => None,
        }
    }
}

/// A chunk as handed to a store for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChunk {
    pub tenant_id: String,
    pub content: String,
    pub source_type: SourceType,
    pub source_url: String,
    pub embedding: Option<Vec<f32>>,
    /// Provider that produced `embedding`; vectors from different providers
    /// are never compared.
    pub embedding_provider: Option<String>,
    pub metadata: serde_json::Value,
}

/// A stored unit of retrievable text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeChunk {
    pub id: String,
    pub tenant_id: String,
    pub content: String,
    pub source_type: SourceType,
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub embedding_provider: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Whether a tenant has a knowledge base yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetupStatus {
    Pending,
    Connected,
}

impl SetupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Connected => "connected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "connected" => Some(Self::Connected),
            _ => None,
        }
    }
}

/// Fields supplied when registering a dot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTenant {
    pub name: String,
    pub domain: String,
    #[serde(default)]
    pub business_context: Option<String>,
    #[serde(default)]
    pub ai_model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

/// One registered dot (chatbot instance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub domain: String,
    pub business_context: Option<String>,
    pub ai_model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub setup_status: SetupStatus,
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    pub fn from_new(id: String, new: NewTenant) -> Self {
        Self {
            id,
            name: new.name,
            domain: new.domain,
            business_context: new.business_context,
            ai_model: new.ai_model,
            temperature: new.temperature,
            max_tokens: new.max_tokens,
            setup_status: SetupStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Running,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit record of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSession {
    pub id: String,
    pub tenant_id: String,
    pub url: String,
    pub status: SessionStatus,
    pub urls_analyzed: u32,
    pub chunks_created: u32,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl AnalysisSession {
    pub fn start(tenant_id: &str, url: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            url: url.to_string(),
            status: SessionStatus::Running,
            urls_analyzed: 0,
            chunks_created: 0,
            error_message: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// One user/assistant turn pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatExchange {
    pub id: String,
    pub tenant_id: String,
    pub user_message: String,
    pub assistant_message: String,
    pub relevant_chunks_used: usize,
    pub user_at: DateTime<Utc>,
    pub assistant_at: DateTime<Utc>,
}
