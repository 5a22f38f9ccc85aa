//! Configuration module for relay-chat.

use serde::Deserialize;
use std::path::Path;

use crate::{ChatError, Result};

/// Environment variable that overrides the listening port.
pub const PORT_ENV: &str = "PORT";

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the browser client (index.html, app assets, sw.js).
    #[serde(default = "default_static_path")]
    pub static_path: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_path() -> String {
    "public".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_path: default_static_path(),
        }
    }
}

/// Chat relay configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Number of recent messages replayed to new connections.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_history_capacity() -> usize {
    100
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
        }
    }
}

/// Client session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the chat server (the page URL in a browser).
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Seconds to wait before reconnecting after a drop.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,
}

fn default_server_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_reconnect_delay() -> u64 {
    5
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            reconnect_delay_secs: default_reconnect_delay(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/relay-chat.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Chat relay configuration.
    #[serde(default)]
    pub chat: ChatConfig,
    /// Client session configuration.
    #[serde(default)]
    pub client: ClientConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ChatError::Io)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ChatError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `PORT`: Override the listening port
    pub fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var(PORT_ENV) {
            self.apply_port_override(&port);
        }
    }

    /// Apply a raw `PORT` value. Empty or unparsable values are ignored.
    fn apply_port_override(&mut self, raw: &str) {
        let raw = raw.trim();
        if raw.is_empty() {
            return;
        }
        match raw.parse::<u16>() {
            Ok(port) => self.server.port = port,
            Err(_) => {
                tracing::warn!(value = raw, "Ignoring invalid {} value", PORT_ENV);
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - History capacity is zero
    /// - Reconnect delay is zero
    pub fn validate(&self) -> Result<()> {
        if self.chat.history_capacity == 0 {
            return Err(ChatError::Config(
                "history_capacity must be at least 1".to_string(),
            ));
        }
        if self.client.reconnect_delay_secs == 0 {
            return Err(ChatError::Config(
                "reconnect_delay_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
