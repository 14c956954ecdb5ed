//! Configuration loading and management.

use quasar_irc::{ConnectionConfig, MODE_INVISIBLE, MODE_VISIBLE};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server connection and identity.
    pub irc: IrcConfig,
}

/// Server connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IrcConfig {
    /// Server address (e.g., "irc.libera.chat:6667").
    pub server: String,
    /// Nickname to register with.
    pub nick: String,
    /// Connection password, sent as PASS when non-empty.
    #[serde(default)]
    pub password: String,
    /// Username; defaults to the nick.
    #[serde(default)]
    pub user: String,
    /// Real name; defaults to the nick.
    #[serde(default)]
    pub realname: String,
    /// Request user mode +i on registration.
    #[serde(default)]
    pub invisible: bool,
    /// Liveness timeout in seconds; 0 selects the library default.
    #[serde(default)]
    pub timeout_secs: u64,
    /// QUIT message used when shutting down on request.
    #[serde(default)]
    pub quit_message: String,
}

impl IrcConfig {
    /// Map onto the connection core's settings.
    pub fn to_connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            server: self.server.clone(),
            password: self.password.clone(),
            nick: self.nick.clone(),
            user: self.user.clone(),
            mode: if self.invisible {
                MODE_INVISIBLE
            } else {
                MODE_VISIBLE
            },
            realname: self.realname.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
