//! Match configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Environment variable overriding [`MatchConfig::authority_url`].
pub const AUTHORITY_URL_ENV: &str = "STRICTLY_BACKGAMMON_AUTHORITY_URL";

/// Timing and transport settings for one match.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
pub struct MatchConfig {
    /// Starting time per player, in seconds.
    #[serde(default = "default_initial_clock_secs")]
    initial_clock_secs: u64,

    /// Delay between the capture and arrival halves of a hit.
    #[serde(default = "default_hit_settle_ms")]
    hit_settle_ms: u64,

    /// How long a blocked player keeps the turn before it ends on its own.
    #[serde(default = "default_blocked_grace_ms")]
    blocked_grace_ms: u64,

    /// Attempts for each persistence write.
    #[serde(default = "default_persist_retries")]
    persist_retries: u32,

    /// Base delay between persistence attempts; grows linearly.
    #[serde(default = "default_persist_backoff_ms")]
    persist_backoff_ms: u64,

    /// Base URL of the game server. Local collaborators are used when unset.
    #[serde(default)]
    authority_url: Option<String>,
}

fn default_initial_clock_secs() -> u64 {
    600
}

fn default_hit_settle_ms() -> u64 {
    250
}

fn default_blocked_grace_ms() -> u64 {
    1_000
}

fn default_persist_retries() -> u32 {
    3
}

fn default_persist_backoff_ms() -> u64 {
    200
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            initial_clock_secs: default_initial_clock_secs(),
            hit_settle_ms: default_hit_settle_ms(),
            blocked_grace_ms: default_blocked_grace_ms(),
            persist_retries: default_persist_retries(),
            persist_backoff_ms: default_persist_backoff_ms(),
            authority_url: None,
        }
    }
}

impl MatchConfig {
    /// Loads configuration from a TOML file. Missing keys take defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(
            initial_clock_secs = config.initial_clock_secs,
            authority_url = ?config.authority_url,
            "Config loaded successfully"
        );
        Ok(config)
    }

    /// Applies overrides from the environment.
    #[instrument(skip(self))]
    pub fn with_env_overrides(self) -> Self {
        match std::env::var(AUTHORITY_URL_ENV) {
            Ok(url) if !url.is_empty() => {
                debug!(%url, "Authority URL taken from environment");
                self.with_authority_url(Some(url))
            }
            _ => self,
        }
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string(self)
            .map_err(|e| ConfigError::new(format!("Failed to render config: {}", e)))
    }

    /// Starting time per player.
    pub fn initial_clock(&self) -> Duration {
        Duration::from_secs(self.initial_clock_secs)
    }

    /// Hit settle delay.
    pub fn hit_settle(&self) -> Duration {
        Duration::from_millis(self.hit_settle_ms)
    }

    /// Blocked-player grace delay.
    pub fn blocked_grace(&self) -> Duration {
        Duration::from_millis(self.blocked_grace_ms)
    }

    /// Base persistence backoff.
    pub fn persist_backoff(&self) -> Duration {
        Duration::from_millis(self.persist_backoff_ms)
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
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
