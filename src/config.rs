//! Configuration loading
//!
//! A TOML file with two optional sections. Every key has a default, so an
//! empty file (or no file at all) yields a working server:
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:12345"
//! max_line_length = 4096
//! typing_timeout_secs = 5
//!
//! [logging]
//! filter = "chat_relay=info"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Default listen address
pub const DEFAULT_BIND: &str = "0.0.0.0:12345";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the listener binds to
    pub bind: String,
    /// Longest accepted input line in bytes
    pub max_line_length: usize,
    /// Seconds after the last TYPING before the server clears the
    /// indicator itself; 0 disables this
    pub typing_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            max_line_length: 4096,
            typing_timeout_secs: 5,
        }
    }
}

impl ServerConfig {
    pub fn typing_timeout(&self) -> Option<Duration> {
        match self.typing_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by RUST_LOG
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "chat_relay=info".to_string(),
        }
    }
}

impl Config {
    /// Load and validate a config file
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.trim().is_empty() {
            return Err(ConfigError::Invalid("server.bind must not be empty".into()));
        }
        if self.server.max_line_length == 0 {
            return Err(ConfigError::Invalid(
                "server.max_line_length must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
