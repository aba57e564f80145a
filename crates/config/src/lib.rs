//! Configuration loading, validation, and management for hospinav.
//!
//! Loads configuration from `~/.hospinav/config.toml` with environment
//! variable overrides. Validates all settings at startup.

pub mod logging;

use hospinav_core::agent::AgentId;
use hospinav_core::persona::WELCOME_MESSAGE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variables checked for the API key, highest priority first.
pub const API_KEY_ENV_VARS: [&str; 3] = ["HOSPINAV_API_KEY", "GEMINI_API_KEY", "API_KEY"];

/// The root configuration structure.
///
/// Maps directly to `~/.hospinav/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// The one required credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model backend settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Intent routing settings
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Specialist generation settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Conversation-level settings
    #[serde(default)]
    pub conversation: ConversationConfig,
}

/// Redact a secret for Debug output.
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
            .field("provider", &self.provider)
            .field("routing", &self.routing)
            .field("generation", &self.generation)
            .field("conversation", &self.conversation)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used by the navigator for classification
    #[serde(default = "default_model")]
    pub routing_model: String,

    /// Model used by the specialists
    #[serde(default = "default_model")]
    pub generation_model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}
fn default_model() -> String {
    "gemini-2.5-flash".into()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            routing_model: default_model(),
            generation_model: default_model(),
            max_output_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default = "default_routing_temperature")]
    pub temperature: f32,

    /// Specialist used whenever classification cannot decide
    #[serde(default = "default_specialist")]
    pub default_specialist: AgentId,

    #[serde(default = "default_routing_timeout")]
    pub timeout_secs: u64,
}

fn default_routing_temperature() -> f32 {
    0.1
}
fn default_specialist() -> AgentId {
    AgentId::PatientInfo
}
fn default_routing_timeout() -> u64 {
    30
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            temperature: default_routing_temperature(),
            default_specialist: default_specialist(),
            timeout_secs: default_routing_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,

    /// How many prior messages a specialist sees
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Format used when `generate_document` names none
    #[serde(default = "default_document_format")]
    pub default_document_format: String,
}

fn default_generation_timeout() -> u64 {
    120
}
fn default_context_window() -> usize {
    6
}
fn default_document_format() -> String {
    "PDF".into()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_generation_timeout(),
            context_window: default_context_window(),
            default_document_format: default_document_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Seed new conversations with the navigator greeting
    #[serde(default = "default_true")]
    pub show_welcome: bool,

    /// Navigator greeting; a blank value seeds nothing
    #[serde(default = "default_welcome_message")]
    pub welcome_message: Option<String>,

    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_true() -> bool {
    true
}
fn default_welcome_message() -> Option<String> {
    Some(WELCOME_MESSAGE.into())
}
fn default_event_capacity() -> usize {
    256
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            show_welcome: default_true(),
            welcome_message: default_welcome_message(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl ConversationConfig {
    /// The greeting to seed, if any.
    pub fn welcome(&self) -> Option<&str> {
        if !self.show_welcome {
            return None;
        }
        self.welcome_message
            .as_deref()
            .filter(|welcome| !welcome.trim().is_empty())
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.hospinav/config.toml).
    ///
    /// Environment overrides:
    /// - `HOSPINAV_API_KEY`, `GEMINI_API_KEY`, `API_KEY` (first set wins, only if no key in file)
    /// - `HOSPINAV_MODEL` (generation model)
    /// - `HOSPINAV_ROUTING_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
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

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = API_KEY_ENV_VARS
                .iter()
                .filter_map(|key| lookup(key))
                .find(|value| !value.trim().is_empty());
        }

        if let Some(model) = lookup("HOSPINAV_MODEL") {
            self.provider.generation_model = model;
        }

        if let Some(model) = lookup("HOSPINAV_ROUTING_MODEL") {
            self.provider.routing_model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".hospinav")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.routing.temperature) {
            return Err(ConfigError::ValidationError(
                "routing.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !self.routing.default_specialist.is_specialist() {
            return Err(ConfigError::ValidationError(
                "routing.default_specialist must be a specialist, not the navigator".into(),
            ));
        }

        if self.routing.timeout_secs == 0 || self.generation.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be greater than zero".into(),
            ));
        }

        if self.generation.default_document_format.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "generation.default_document_format must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: ProviderConfig::default(),
            routing: RoutingConfig::default(),
            generation: GenerationConfig::default(),
            conversation: ConversationConfig::default(),
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
