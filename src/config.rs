use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "http://localhost:3000/api";
pub const DEFAULT_STREAM_PATH: &str = "/realtime/stream";
pub const DEFAULT_EVENTS_PATH: &str = "/analytics/events";
pub const DEFAULT_SOURCE: &str = "mobile";
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5_000;
pub const DEFAULT_DRAIN_INTERVAL_MS: u64 = 30_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("invalid value for {key}: {value}")]
    Env { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_stream_path")]
    pub stream_path: String,
    #[serde(default = "default_events_path")]
    pub events_path: String,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    #[serde(default = "default_drain_interval_ms")]
    pub drain_interval_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Drop events the server rejects with a non-retryable 4xx instead of queueing them.
    #[serde(default)]
    pub discard_rejected: bool,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            stream_path: default_stream_path(),
            events_path: default_events_path(),
            auth_token: None,
            source: default_source(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            drain_interval_ms: default_drain_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            queue_capacity: default_queue_capacity(),
            discard_rejected: false,
            data_dir: None,
        }
    }
}

impl SyncConfig {
    /// Build a config from the process environment, loading `.env` first.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("failed to load .env file: {e}");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from defaults overridden by `lookup(CONTENTSYNC_*)`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(api_base) = var("CONTENTSYNC_API_BASE") {
            config.api_base = api_base;
        }
        if let Some(token) = var("CONTENTSYNC_AUTH_TOKEN") {
            config.auth_token = Some(token);
        }
        if let Some(source) = var("CONTENTSYNC_SOURCE") {
            config.source = source;
        }
        if let Some(dir) = var("CONTENTSYNC_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(raw) = var("CONTENTSYNC_RECONNECT_DELAY_MS") {
            config.reconnect_delay_ms = parse_env("CONTENTSYNC_RECONNECT_DELAY_MS", &raw)?;
        }
        if let Some(raw) = var("CONTENTSYNC_DRAIN_INTERVAL_MS") {
            config.drain_interval_ms = parse_env("CONTENTSYNC_DRAIN_INTERVAL_MS", &raw)?;
        }
        if let Some(raw) = var("CONTENTSYNC_QUEUE_CAPACITY") {
            config.queue_capacity = parse_env("CONTENTSYNC_QUEUE_CAPACITY", &raw)?;
        }
        if let Some(raw) = var("CONTENTSYNC_DISCARD_REJECTED") {
            config.discard_rejected = matches!(
                raw.to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base cannot be empty".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "queue_capacity must be greater than 0".to_string(),
            ));
        }
        if self.request_timeout_ms == 0 || self.connect_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "timeouts must be greater than 0".to_string(),
            ));
        }
        if self.drain_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "drain_interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn stream_url(&self) -> String {
        join_url(&self.api_base, &self.stream_path)
    }

    pub fn events_url(&self) -> String {
        join_url(&self.api_base, &self.events_path)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn drain_interval(&self) -> Duration {
        Duration::from_millis(self.drain_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Directory holding the durable store.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }

        #[cfg(target_os = "windows")]
        {
            if let Ok(app_data) = std::env::var("APPDATA") {
                return PathBuf::from(app_data).join("ContentSync");
            }
        }

        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".contentsync");
        }

        if let Ok(home) = std::env::var("USERPROFILE") {
            return PathBuf::from(home).join(".contentsync");
        }

        PathBuf::from(".contentsync")
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir().join("contentsync.db")
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim().trim_end_matches('/'),
        path.trim().trim_start_matches('/')
    )
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Env {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_stream_path() -> String {
    DEFAULT_STREAM_PATH.to_string()
}

fn default_events_path() -> String {
    DEFAULT_EVENTS_PATH.to_string()
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    DEFAULT_RECONNECT_DELAY_MS
}

fn default_drain_interval_ms() -> u64 {
    DEFAULT_DRAIN_INTERVAL_MS
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}
