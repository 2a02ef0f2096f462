//! Configuration management for Dot.
//!
//! Configuration is layered, later sources winning:
//! - Built-in defaults
//! - Config file (`.dot/config.yaml` in the workspace, or `DOT_CONFIG`)
//! - Environment variables
//! - Command-line flags (`with_overrides`)
//!
//! The configuration is workspace-centric: the SQLite store and prompt
//! overrides live under `.dot/`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the generation factory knows how to build.
pub const KNOWN_LLM_PROVIDERS: [&str; 2] = ["openai", "ollama"];

/// Embedding providers `EmbeddingChain::from_config` understands.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["openai", "hashed"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .dot/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// API key for the networked providers
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub analysis: AnalysisSettings,
    pub chat: ChatSettings,
    pub server: ServerSettings,
}

/// Generation provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmSettings {
    /// Provider identifier ("openai", "ollama")
    pub provider: String,

    /// Default chat model (tenants may override it)
    pub model: String,

    /// Custom endpoint; provider default when absent
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Caller-side deadline for one completion
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            endpoint: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingSettings {
    /// Primary provider ("openai" or "hashed")
    pub provider: String,

    /// Model for the primary provider
    pub model: String,

    /// Vector length shared by every provider in the chain
    pub dimensions: usize,

    pub endpoint: Option<String>,

    pub timeout_secs: u64,

    /// Append the local hashed provider behind the primary
    pub fallback: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            endpoint: None,
            timeout_secs: 15,
            fallback: true,
        }
    }
}

/// Retrieval tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrievalSettings {
    /// Minimum cosine similarity for a chunk to count as relevant
    pub threshold: f32,

    /// Maximum number of chunks handed to the composer
    pub limit: usize,

    /// Number of history turns (not exchanges) kept in the prompt
    pub history_turns: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            limit: 5,
            history_turns: 6,
        }
    }
}

/// Website analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisSettings {
    /// Model used by the model-driven analyzer
    pub model: String,

    pub temperature: f32,

    pub max_tokens: u32,

    /// Concurrent embed-and-store operations per run
    pub concurrency: usize,

    pub timeout_secs: u64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.3,
            max_tokens: 3000,
            concurrency: 4,
            timeout_secs: 60,
        }
    }
}

/// Chat response defaults for tenants that do not configure them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatSettings {
    pub default_temperature: f32,

    pub default_max_tokens: u32,

    /// Length of the chunk excerpt used when generation fails
    pub excerpt_chars: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            default_temperature: 0.7,
            default_max_tokens: 500,
            excerpt_chars: 200,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8787".to_string(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSettings>,
    embedding: Option<EmbeddingSettings>,
    retrieval: Option<RetrievalSettings>,
    analysis: Option<AnalysisSettings>,
    chat: Option<ChatSettings>,
    server: Option<ServerSettings>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: LlmSettings::default(),
            embedding: EmbeddingSettings::default(),
            retrieval: RetrievalSettings::default(),
            analysis: AnalysisSettings::default(),
            chat: ChatSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML file and environment variables.
    ///
    /// Environment variables:
    /// - `DOT_WORKSPACE`: Override workspace path
    /// - `DOT_CONFIG`: Path to config file
    /// - `DOT_PROVIDER`: Generation provider
    /// - `DOT_MODEL`: Default chat model
    /// - `DOT_API_KEY`: API key (otherwise read from `llm.apiKeyEnv`)
    /// - `DOT_BIND`: Server bind address
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Like `load`, with an explicit workspace and config file taking
    /// precedence over `DOT_WORKSPACE` and `DOT_CONFIG`.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        let workspace =
            workspace.or_else(|| std::env::var("DOT_WORKSPACE").ok().map(PathBuf::from));
        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("DOT_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.dot_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("DOT_PROVIDER") {
            config.llm.provider = provider;
        }

        if let Ok(model) = std::env::var("DOT_MODEL") {
            config.llm.model = model;
        }

        if let Ok(bind) = std::env::var("DOT_BIND") {
            config.server.bind = bind;
        }

        config.api_key = std::env::var("DOT_API_KEY").ok();

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let file: ConfigFile = serde_yaml::from_str(contents)?;
        let mut result = self.clone();

        if let Some(path) = file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = file.llm {
            result.llm = llm;
        }
        if let Some(embedding) = file.embedding {
            result.embedding = embedding;
        }
        if let Some(retrieval) = file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(analysis) = file.analysis {
            result.analysis = analysis;
        }
        if let Some(chat) = file.chat {
            result.chat = chat;
        }
        if let Some(server) = file.server {
            result.server = server;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and the file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.llm.provider = provider;
        }

        if let Some(model) = model {
            self.llm.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .dot directory.
    pub fn dot_dir(&self) -> PathBuf {
        self.workspace.join(".dot")
    }

    /// Ensure the .dot directory exists.
    pub fn ensure_dot_dir(&self) -> AppResult<()> {
        let dot_dir = self.dot_dir();
        if !dot_dir.exists() {
            std::fs::create_dir_all(&dot_dir).map_err(|e| {
                AppError::Config(format!("Failed to create .dot directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Path of the SQLite database backing the store adapters.
    pub fn store_path(&self) -> PathBuf {
        self.dot_dir().join("dot.sqlite")
    }

    /// Directory searched for prompt overrides.
    pub fn prompts_dir(&self) -> PathBuf {
        self.dot_dir().join("prompts")
    }

    /// Resolve the API key: explicit `DOT_API_KEY` first, then `llm.apiKeyEnv`.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    /// Validate provider names and numeric ranges.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_LLM_PROVIDERS.contains(&self.llm.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.llm.provider,
                KNOWN_LLM_PROVIDERS.join(", ")
            )));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding.dimensions must be greater than zero".to_string(),
            ));
        }

        if !(-1.0..=1.0).contains(&self.retrieval.threshold) {
            return Err(AppError::Config(format!(
                "retrieval.threshold must lie in [-1, 1], got {}",
                self.retrieval.threshold
            )));
        }

        if self.retrieval.limit == 0 {
            return Err(AppError::Config(
                "retrieval.limit must be greater than zero".to_string(),
            ));
        }

        if self.analysis.concurrency == 0 {
            return Err(AppError::Config(
                "analysis.concurrency must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.embedding.dimensions, 1536);
        assert_eq!(config.retrieval.threshold, 0.7);
        assert_eq!(config.retrieval.limit, 5);
        assert_eq!(config.chat.default_max_tokens, 500);
        assert!(!config.verbose);
    }

    #[test]
    fn test_dot_dir_paths() {
        let config = AppConfig::default();
        assert!(config.dot_dir().ends_with(".dot"));
        assert!(config.store_path().ends_with("dot.sqlite"));
        assert!(config.prompts_dir().ends_with("prompts"));
    }

    #[test]
    fn test_with_overrides() {
        let overridden = AppConfig::default().with_overrides(
            None,
            None,
            Some("ollama".to_string()),
            Some("llama3.2".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.llm.provider, "ollama");
        assert_eq!(overridden.llm.model, "llama3.2");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml_sections() {
        let yaml = r#"
retrieval:
  threshold: 0.5
  limit: 3
embedding:
  provider: hashed
  dimensions: 256
logging:
  level: warn
  color: false
"#;
        let merged = AppConfig::default().merge_yaml_str(yaml).unwrap();
        assert_eq!(merged.retrieval.threshold, 0.5);
        assert_eq!(merged.retrieval.limit, 3);
        assert_eq!(merged.retrieval.history_turns, 6);
        assert_eq!(merged.embedding.provider, "hashed");
        assert_eq!(merged.embedding.dimensions, 256);
        assert_eq!(merged.embedding.timeout_secs, 15);
        assert_eq!(merged.log_level, Some("warn".to_string()));
        assert!(merged.no_color);
    }

    #[test]
    fn test_merge_yaml_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "server:\n  bind: 0.0.0.0:9000\n").unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.server.bind, "0.0.0.0:9000");
    }

    #[test]
    fn test_load_from_explicit_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("custom.yaml");
        std::fs::write(&path, "retrieval:\n  limit: 2\n").unwrap();

        let config =
            AppConfig::load_from(Some(dir.path().to_path_buf()), Some(path.clone())).unwrap();
        assert_eq!(config.workspace, dir.path());
        assert_eq!(config.config_file, Some(path));
        assert_eq!(config.retrieval.limit, 2);
    }

    #[test]
    fn test_load_from_missing_workspace() {
        let result = AppConfig::load_from(Some(PathBuf::from("/definitely/not/here")), None);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.llm.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_threshold_range() {
        let mut config = AppConfig::default();
        config.retrieval.threshold = 1.5;
        assert!(config.validate().is_err());

        config.retrieval.threshold = 0.7;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let mut config = AppConfig::default();
        config.analysis.concurrency = 0;
        assert!(config.validate().is_err());
    }
}
