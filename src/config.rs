//! Application configuration: storage location and rate-limit scopes.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "BINGO_CONFIG";

/// Limits for one admission scope.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum admitted requests per window.
    limit: u64,

    /// Window length in seconds.
    window_secs: u64,

    /// Prefix for counter keys, e.g. `rl:api`.
    key_prefix: String,
}

impl RateLimitConfig {
    /// Creates a rate-limit configuration.
    #[instrument(skip(key_prefix), fields(key_prefix = %key_prefix.as_ref()))]
    pub fn new(limit: u64, window: Duration, key_prefix: impl AsRef<str>) -> Self {
        Self {
            limit,
            window_secs: window.as_secs(),
            key_prefix: key_prefix.as_ref().to_string(),
        }
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Counter key for a client within this scope: `prefix:client`.
    pub fn scoped_key(&self, client_key: &str) -> String {
        format!("{}:{}", self.key_prefix, client_key)
    }

    /// Checks that the limit and window are non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limit == 0 {
            return Err(ConfigError::new(format!(
                "Rate limit '{}' must admit at least one request",
                self.key_prefix
            )));
        }
        if self.window_secs == 0 {
            return Err(ConfigError::new(format!(
                "Rate limit '{}' needs a window of at least one second",
                self.key_prefix
            )));
        }
        Ok(())
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding one JSON file per card.
    #[serde(default = "default_storage_path")]
    storage_path: PathBuf,

    /// Redis URL for the shared counter store; in-memory when absent.
    #[serde(default)]
    redis_url: Option<String>,

    /// Named admission scopes.
    #[serde(default = "default_rate_limits")]
    rate_limits: BTreeMap<String, RateLimitConfig>,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("cards")
}

fn default_rate_limits() -> BTreeMap<String, RateLimitConfig> {
    let minute = Duration::from_secs(60);
    BTreeMap::from([
        ("api".to_string(), RateLimitConfig::new(100, minute, "rl:api")),
        ("auth".to_string(), RateLimitConfig::new(5, minute, "rl:auth")),
        ("suggestions".to_string(), RateLimitConfig::new(10, minute, "rl:ai")),
    ])
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            redis_url: None,
            rate_limits: default_rate_limits(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed, or validated.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(scopes = config.rate_limits.len(), "Config loaded successfully");
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on parse or validation failure.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads from the file named by `BINGO_CONFIG`, or defaults when unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the named file is unusable.
    #[instrument]
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::from_file(path),
            Err(_) => {
                debug!("No config file configured, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Overrides the storage directory.
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    /// Looks up a named admission scope.
    pub fn rate_limit(&self, scope: &str) -> Option<&RateLimitConfig> {
        self.rate_limits.get(scope)
    }

    /// Validates every rate-limit scope.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rate_limits.values().try_for_each(RateLimitConfig::validate)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
