//! Application configuration.

use crate::context::Role;
use crate::error::{SessionError, SessionResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tickview_ws::ConnectionConfig;

/// Default config path, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "TICKVIEW_CONFIG";

/// Environment variable carrying the bearer token.
pub const TOKEN_ENV: &str = "TICKVIEW_TOKEN";

/// Push channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// WebSocket URL. Unset means poll only.
    #[serde(default)]
    pub url: Option<String>,
    /// Sent once when the channel opens.
    #[serde(default)]
    pub subscribe_message: Option<String>,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Reconnection attempts before failing over to polling (0 = none).
    #[serde(default)]
    pub max_reconnect_attempts: u32,
    #[serde(default = "default_reconnect_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_reconnect_base_delay_ms() -> u64 {
    1_000
}

fn default_reconnect_max_delay_ms() -> u64 {
    30_000
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            url: None,
            subscribe_message: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            max_reconnect_attempts: 0,
            reconnect_base_delay_ms: default_reconnect_base_delay_ms(),
            reconnect_max_delay_ms: default_reconnect_max_delay_ms(),
        }
    }
}

impl PushConfig {
    /// Connection settings, or `None` when no push endpoint is configured.
    pub fn connection_config(&self) -> Option<ConnectionConfig> {
        let url = self.url.as_deref().filter(|u| !u.trim().is_empty())?;
        Some(ConnectionConfig {
            url: url.to_string(),
            subscribe_message: self.subscribe_message.clone(),
            connect_timeout_ms: self.connect_timeout_ms,
            max_reconnect_attempts: self.max_reconnect_attempts,
            reconnect_base_delay_ms: self.reconnect_base_delay_ms,
            reconnect_max_delay_ms: self.reconnect_max_delay_ms,
        })
    }
}

/// Poll fallback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
    /// A fetch slower than this counts as a failed cycle.
    #[serde(default = "default_poll_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    4_000
}

fn default_poll_timeout_ms() -> u64 {
    3_000
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            timeout_ms: default_poll_timeout_ms(),
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub role: Role,
    /// Capacity of the engine event queue.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_event_buffer() -> usize {
    1024
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            role: Role::User,
            event_buffer: default_event_buffer(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Where [`AppConfig::load`] found its values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(String),
    /// The file was not found; defaults are in use.
    Defaults { missing: String },
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the collaborator REST API.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_api_url() -> String {
    "http://localhost:4000/api".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            push: PushConfig::default(),
            poll: PollConfig::default(),
            session: SessionConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Path priority: `explicit` > `TICKVIEW_CONFIG` > `config/default.toml`.
    /// A missing file yields defaults. Nothing is logged here, so this can run
    /// before logging is initialized; the caller reports the returned source.
    pub fn load(explicit: Option<&str>) -> SessionResult<(Self, ConfigSource)> {
        let config_path = explicit
            .map(str::to_string)
            .or_else(|| std::env::var(CONFIG_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        let (config, source) = if Path::new(&config_path).exists() {
            (Self::from_file(&config_path)?, ConfigSource::File(config_path))
        } else {
            (Self::default(), ConfigSource::Defaults { missing: config_path })
        };
        config.validate()?;
        Ok((config, source))
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> SessionResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SessionError::Config(format!("Failed to read config: {e}")))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> SessionResult<Self> {
        toml::from_str(content)
            .map_err(|e| SessionError::Config(format!("Failed to parse config: {e}")))
    }

    pub fn validate(&self) -> SessionResult<()> {
        if self.api_url.trim().is_empty() {
            return Err(SessionError::Config("api_url must not be empty".to_string()));
        }
        if self.poll.interval_ms == 0 {
            return Err(SessionError::Config("poll.interval_ms must be > 0".to_string()));
        }
        if self.poll.timeout_ms == 0 {
            return Err(SessionError::Config("poll.timeout_ms must be > 0".to_string()));
        }
        if self.push.connect_timeout_ms == 0 {
            return Err(SessionError::Config(
                "push.connect_timeout_ms must be > 0".to_string(),
            ));
        }
        if self.session.event_buffer == 0 {
            return Err(SessionError::Config(
                "session.event_buffer must be > 0".to_string(),
            ));
        }
        if let Some(url) = self.push.url.as_deref().filter(|u| !u.trim().is_empty()) {
            if !(url.starts_with("ws://") || url.starts_with("wss://")) {
                return Err(SessionError::Config(format!(
                    "push.url must use ws:// or wss://, got {url:?}"
                )));
            }
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
        assert_eq!(config.poll.interval_ms, 4000);
        assert_eq!(config.poll.timeout_ms, 3000);
        assert_eq!(config.push.max_reconnect_attempts, 0);
        assert_eq!(config.session.role, Role::User);
        assert!(config.push.connection_config().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = AppConfig::from_toml(
            r#"
            api_url = "http://example.test/api"

            [push]
            url = "wss://example.test/ws"

            [session]
            role = "admin"
            "#,
        )
        .unwrap();

        assert_eq!(config.api_url, "http://example.test/api");
        assert_eq!(config.poll.interval_ms, 4000);
        assert_eq!(config.session.role, Role::Admin);
        assert_eq!(config.session.event_buffer, 1024);

        let conn = config.push.connection_config().unwrap();
        assert_eq!(conn.url, "wss://example.test/ws");
        assert_eq!(conn.connect_timeout_ms, 5000);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.poll.interval_ms = 0;
        assert!(matches!(config.validate(), Err(SessionError::Config(_))));

        let mut config = AppConfig::default();
        config.poll.timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.api_url = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.push.url = Some("http://example.test/ws".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_push_url_means_poll_only() {
        let mut config = AppConfig::default();
        config.push.url = Some(String::new());

        assert!(config.validate().is_ok());
        assert!(config.push.connection_config().is_none());
    }

    #[test]
    fn test_unparseable_toml_is_config_error() {
        assert!(matches!(
            AppConfig::from_toml("api_url = ["),
            Err(SessionError::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file_reports_defaults() {
        let (config, source) = AppConfig::load(Some("does/not/exist.toml")).unwrap();

        assert_eq!(config.poll.interval_ms, 4000);
        assert_eq!(
            source,
            ConfigSource::Defaults {
                missing: "does/not/exist.toml".to_string()
            }
        );
    }

    #[test]
    fn test_config_serialization() {
        let toml_str = toml::to_string(&AppConfig::default()).unwrap();
        assert!(toml_str.contains("api_url"));
        assert!(toml_str.contains("interval_ms"));
    }
}
