//! Configuration loading and validation for loopclaw.
//!
//! Settings come from an optional `~/.loopclaw/config.toml`, then a `.env`
//! file in the working directory, then the process environment. The
//! provider credential is only ever taken from the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the provider credential.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";
/// Environment variable overriding the provider endpoint.
pub const BASE_URL_ENV: &str = "OPENROUTER_BASE_URL";
/// Environment variable overriding the model.
pub const MODEL_ENV: &str = "LOOPCLAW_MODEL";
/// Environment variable overriding the turn limit.
pub const MAX_TURNS_ENV: &str = "LOOPCLAW_MAX_TURNS";
/// Environment variable pointing at an alternate config file.
pub const CONFIG_PATH_ENV: &str = "LOOPCLAW_CONFIG";

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Provider credential, resolved from the environment only
    #[serde(skip)]
    pub api_key: Option<String>,

    /// Base URL of the chat-completion API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model requested on every turn
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum provider round trips per run
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Upper bound on a single provider request
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Upper bound on a single `Bash` tool invocation
    #[serde(default = "default_timeout_secs")]
    pub command_timeout_secs: u64,

    /// Sampling temperature (provider default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens per response (provider default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Shell commands the `Bash` tool may run. Empty = unrestricted.
    #[serde(default)]
    pub allowed_commands: Vec<String>,
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_model() -> String {
    "anthropic/claude-haiku-4.5".into()
}
fn default_max_turns() -> u32 {
    50
}
fn default_timeout_secs() -> u64 {
    120
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field(
                "api_key",
                &self.api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_turns", &self.max_turns)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("command_timeout_secs", &self.command_timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("allowed_commands", &self.allowed_commands)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from file, `.env`, and environment.
    ///
    /// A missing credential is not an error here; call
    /// [`AppConfig::require_api_key`] before talking to the provider.
    pub fn load() -> Result<Self, ConfigError> {
        // Variables already set in the environment win over `.env`.
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }

        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file found at {}, using defaults", path.display());
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

    /// Overlay environment values using `lookup` as the variable source.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup(API_KEY_ENV) {
            self.api_key = Some(key);
        }

        if let Some(url) = lookup(BASE_URL_ENV) {
            self.base_url = url;
        }

        if let Some(model) = lookup(MODEL_ENV) {
            self.model = model;
        }

        if let Some(turns) = lookup(MAX_TURNS_ENV) {
            self.max_turns = turns.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "{MAX_TURNS_ENV} must be a positive integer, got '{turns}'"
                ))
            })?;
        }

        self.validate()
    }

    /// The credential, or a fatal error naming the variable to set.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or(ConfigError::MissingApiKey { var: API_KEY_ENV })
    }

    /// Path of the config file: `$LOOPCLAW_CONFIG` or `~/.loopclaw/config.toml`.
    pub fn config_path() -> PathBuf {
        std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::config_dir().join("config.toml"))
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".loopclaw")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError("base_url must not be empty".into()));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }

        if self.max_turns == 0 {
            return Err(ConfigError::ValidationError("max_turns must be at least 1".into()));
        }

        if self.request_timeout_secs == 0 || self.command_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be at least 1 second".into(),
            ));
        }

        if let Some(t) = self.temperature
            && !(0.0..=2.0).contains(&t)
        {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            max_turns: default_max_turns(),
            request_timeout_secs: default_timeout_secs(),
            command_timeout_secs: default_timeout_secs(),
            temperature: None,
            max_tokens: None,
            allowed_commands: Vec::new(),
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

    #[error("{var} is not set")]
    MissingApiKey { var: &'static str },
}

impl From<ConfigError> for loopclaw_core::Error {
    fn from(err: ConfigError) -> Self {
        loopclaw_core::Error::config(err.to_string())
    }
}
