//! Core configuration types and loading.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Agent configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Network server and identity.
    pub server: ServerConfig,
    /// Reconnect, pacing and admin settings.
    #[serde(default)]
    pub agent: AgentConfig,
    /// Log file location.
    #[serde(default)]
    pub logs: LogsConfig,
    /// Where the desired channel set comes from.
    #[serde(default)]
    pub channels: ChannelsConfig,
    /// Diagnostic output format.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Server connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Hostname (e.g., "irc.chat.twitch.tv").
    pub host: String,
    /// Port (default: 6667).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Wrap the connection in TLS.
    #[serde(default)]
    pub tls: bool,
    /// Verify the server certificate when `tls` is set (default: true).
    #[serde(default = "default_true")]
    pub verify_cert: bool,
    /// Nickname to register with.
    pub nickname: String,
    /// Connection password (e.g., an `oauth:` token).
    #[serde(default)]
    pub password: Option<String>,
    /// IRCv3 capabilities to request (e.g., "twitch.tv/membership").
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Seconds allowed for TCP/TLS setup (default: 30).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

impl ServerConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

/// Agent behaviour configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Nick allowed to issue `!logping` / `!logreload`.
    #[serde(default)]
    pub admin: Option<String>,
    /// Seconds between reconnect checks (default: 5).
    #[serde(default = "default_reconnection_interval")]
    pub reconnection_interval: u64,
    /// Joins per batch before pausing (default: 40).
    #[serde(default = "default_channel_limit")]
    pub channel_limit: usize,
    /// Seconds to pause between join batches (default: 20).
    #[serde(default = "default_channel_limit_wait")]
    pub channel_limit_wait: u64,
    /// Seconds between flushes of a buffered log file (default: 5).
    #[serde(default = "default_flush_interval")]
    pub flush_interval: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            admin: None,
            reconnection_interval: default_reconnection_interval(),
            channel_limit: default_channel_limit(),
            channel_limit_wait: default_channel_limit_wait(),
            flush_interval: default_flush_interval(),
        }
    }
}

impl AgentConfig {
    pub fn reconnection_interval(&self) -> Duration {
        Duration::from_secs(self.reconnection_interval)
    }

    pub fn channel_limit_wait(&self) -> Duration {
        Duration::from_secs(self.channel_limit_wait)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval)
    }
}

/// Log file location.
#[derive(Debug, Clone, Deserialize)]
pub struct LogsConfig {
    /// Base directory; join/part logs go to `<directory>/joins` (default: "logs").
    #[serde(default = "default_log_directory")]
    pub directory: String,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
        }
    }
}

impl LogsConfig {
    pub fn directory(&self) -> PathBuf {
        PathBuf::from(&self.directory)
    }
}

/// Desired channel source.
///
/// When `database` is set, enabled rows of its `channels` table are used and
/// `list` is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelsConfig {
    /// Static channel list.
    #[serde(default)]
    pub list: Vec<String>,
    /// Path to a SQLite database with a `channels(name, enabled)` table.
    #[serde(default)]
    pub database: Option<String>,
}

/// Diagnostic log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Diagnostic logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}
