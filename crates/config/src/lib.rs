//! Configuration loading, validation, and management for RelayDesk.
//!
//! Loads configuration from `~/.relaydesk/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.relaydesk/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default model-execution provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Persona prompt and generation limits
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Where the knowledge and directives documents live
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Optional retrieval-augmentation service
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("assistant", &self.assistant)
            .field("knowledge", &self.knowledge)
            .field("retrieval", &self.retrieval)
            .field("gateway", &self.gateway)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl std::fmt::Debug for RetrievalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalConfig")
            .field("enabled", &self.enabled)
            .field("url", &self.url)
            .field("api_key", &redact(&self.api_key))
            .field("synthesize", &self.synthesize)
            .field("tenant", &self.tenant)
            .finish()
    }
}

/// Baseline persona and generation limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// System prompt added when the conversation carries none
    #[serde(default = "default_baseline_prompt")]
    pub baseline_prompt: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Bounded output length per response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// How many FAQ entries are injected per request
    #[serde(default = "default_faq_max_entries")]
    pub faq_max_entries: usize,

    /// Answer text is truncated to this many characters
    #[serde(default = "default_faq_max_answer_chars")]
    pub faq_max_answer_chars: usize,
}

pub const DEFAULT_BASELINE_PROMPT: &str = "You are a friendly, concise support assistant. \
Answer using the resources and policy provided to you. If you do not know the answer, \
say so and point the user to the most relevant link instead of guessing.";

fn default_baseline_prompt() -> String {
    DEFAULT_BASELINE_PROMPT.into()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u32 {
    512
}
fn default_faq_max_entries() -> usize {
    5
}
fn default_faq_max_answer_chars() -> usize {
    400
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            baseline_prompt: default_baseline_prompt(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            faq_max_entries: default_faq_max_entries(),
            faq_max_answer_chars: default_faq_max_answer_chars(),
        }
    }
}

/// Location of the static knowledge documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// A directory, or an `http(s)://` base URL
    #[serde(default = "default_knowledge_base")]
    pub base: String,

    #[serde(default = "default_faq_path")]
    pub faq_path: String,

    #[serde(default = "default_directives_path")]
    pub directives_path: String,
}

fn default_knowledge_base() -> String {
    "public".into()
}
fn default_faq_path() -> String {
    "kb.json".into()
}
fn default_directives_path() -> String {
    "directives.json".into()
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            base: default_knowledge_base(),
            faq_path: default_faq_path(),
            directives_path: default_directives_path(),
        }
    }
}

impl KnowledgeConfig {
    /// Whether the documents are fetched over HTTP rather than read from disk.
    pub fn is_remote(&self) -> bool {
        self.base.starts_with("http://") || self.base.starts_with("https://")
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of the retrieval service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Prefer the synthesized-answer endpoint over raw search
    #[serde(default = "default_true")]
    pub synthesize: bool,

    /// Optional tenant filter tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: None,
            api_key: None,
            synthesize: true,
            tenant: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Directory served for every path other than the chat endpoint
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_port() -> u16 {
    8787
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_static_dir() -> String {
    "public".into()
}
fn default_max_body_bytes() -> usize {
    1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            static_dir: default_static_dir(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.relaydesk/config.toml).
    ///
    /// Also checks environment variables:
    /// - `RELAYDESK_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `RELAYDESK_PROVIDER`, `RELAYDESK_MODEL`, `RELAYDESK_KNOWLEDGE_BASE`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if self.api_key.is_none() {
            self.api_key = std::env::var("RELAYDESK_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("RELAYDESK_PROVIDER") {
            self.default_provider = provider;
        }

        if let Ok(model) = std::env::var("RELAYDESK_MODEL") {
            self.default_model = model;
        }

        if let Ok(base) = std::env::var("RELAYDESK_KNOWLEDGE_BASE") {
            self.knowledge.base = base;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".relaydesk")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let assistant = &self.assistant;
        if assistant.temperature < 0.0 || assistant.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "assistant.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if assistant.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "assistant.max_tokens must be > 0".into(),
            ));
        }

        if assistant.faq_max_entries == 0 || assistant.faq_max_answer_chars == 0 {
            return Err(ConfigError::ValidationError(
                "assistant.faq_max_entries and assistant.faq_max_answer_chars must be > 0".into(),
            ));
        }

        if self.retrieval.enabled && self.retrieval.url.is_none() {
            return Err(ConfigError::ValidationError(
                "retrieval.url is required when retrieval is enabled".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            assistant: AssistantConfig::default(),
            knowledge: KnowledgeConfig::default(),
            retrieval: RetrievalConfig::default(),
            gateway: GatewayConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
