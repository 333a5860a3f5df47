//! Application Configuration Module
//!
//! Settings come from environment variables (optionally seeded from a `.env`
//! file) and can be overridden on the command line.

use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_WS_URL: &str = "ws://127.0.0.1:12393/client-ws";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:12393";

/// Holds all configuration loaded from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub ws_url: String,
    pub base_url: String,
    pub log_level: Level,
    pub auto_start_mic: bool,
    pub playback_timeout: Option<Duration>,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
    #[error("Invalid boolean for {var}: {value}")]
    InvalidBool { var: String, value: String },
    #[error("Invalid millisecond count for PLAYBACK_TIMEOUT_MS: {0}")]
    InvalidTimeout(String),
    #[error("Failed to read env file: {0}")]
    EnvFile(#[from] dotenvy::Error),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `AVATAR_WS_URL`: (Optional) Backend WebSocket endpoint. Defaults to the local backend.
    // *   `AVATAR_BASE_URL`: (Optional) Origin relative model URLs resolve against.
    // *   `AUTO_START_MIC`: (Optional) Reopen the mic when the avatar finishes a turn. Defaults to false.
    // *   `PLAYBACK_TIMEOUT_MS`: (Optional) Give up on a clip after this long. Unset or 0 waits forever.
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. This is useful for local development and is ignored if not present.
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from an env file only, ignoring the process environment.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut vars = HashMap::new();
        for item in dotenvy::from_path_iter(path)? {
            let (key, value) = item?;
            vars.insert(key, value);
        }
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let ws_url = lookup("AVATAR_WS_URL").unwrap_or_else(|| DEFAULT_WS_URL.to_string());
        let base_url = lookup("AVATAR_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let auto_start_mic = match lookup("AUTO_START_MIC") {
            Some(value) => parse_bool("AUTO_START_MIC", &value)?,
            None => false,
        };

        let playback_timeout = match lookup("PLAYBACK_TIMEOUT_MS") {
            Some(value) => {
                let millis = value
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidTimeout(value.clone()))?;
                (millis > 0).then(|| Duration::from_millis(millis))
            }
            None => None,
        };

        // Configure logging level from RUST_LOG, with a sensible default.
        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(Self {
            ws_url,
            base_url,
            log_level,
            auto_start_mic,
            playback_timeout,
        })
    }

    /// Applies command-line overrides on top of the loaded values.
    pub fn with_overrides(mut self, ws_url: Option<String>, base_url: Option<String>) -> Self {
        if let Some(ws_url) = ws_url {
            self.ws_url = ws_url;
        }
        if let Some(base_url) = base_url {
            self.base_url = base_url;
        }
        self
    }
}

fn parse_bool(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var: var.to_string(),
            value: value.to_string(),
        }),
    }
}
