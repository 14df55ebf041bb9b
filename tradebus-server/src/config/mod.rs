//! Configuration module for tradebus-server.
//!
//! Handles loading configuration from the TOML file and CLI overrides, and
//! turns it into the runtime settings types of `tradebus_sdk::config`.

pub mod file;

use crate::config::file::{ExchangeConfig as FileExchangeConfig, FileConfig};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tradebus_sdk::config::{ChannelSettings, DisplaySettings, ExchangeConfig, ServerConfig};

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub channels: ChannelSettings,
    pub display: DisplaySettings,
    pub exchanges: Vec<ExchangeConfig>,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Read, override, validate and convert the configuration file.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        self.parse(&config_content)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn parse(&self, content: &str) -> Result<LoadedConfig, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        validate(&file_config)?;
        Ok(build_loaded_config(file_config))
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.exchanges.is_empty() {
        return Err(ConfigError::ValidationError(
            "at least one exchange must be configured".to_string(),
        ));
    }
    let mut names = HashSet::new();
    for exchange in &config.exchanges {
        if exchange.name.is_empty() {
            return Err(ConfigError::ValidationError(
                "exchange name must not be empty".to_string(),
            ));
        }
        if !names.insert(exchange.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "exchange {} is configured twice",
                exchange.name
            )));
        }
        if exchange.symbols.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "exchange {} has no symbols",
                exchange.name
            )));
        }
        if exchange.feed_interval_ms == 0 {
            return Err(ConfigError::ValidationError(format!(
                "exchange {} has a zero feed interval",
                exchange.name
            )));
        }
    }
    Ok(())
}

fn build_loaded_config(file_config: FileConfig) -> LoadedConfig {
    LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        channels: ChannelSettings::new(
            file_config.channels.queue_size,
            file_config.channels.symbol_required,
        ),
        display: DisplaySettings {
            callbacks_logs: file_config.display.callbacks_logs,
        },
        exchanges: file_config
            .exchanges
            .into_iter()
            .map(convert_exchange)
            .collect(),
    }
}

fn convert_exchange(e: FileExchangeConfig) -> ExchangeConfig {
    ExchangeConfig {
        name: e.name.into(),
        symbols: e.symbols.into_iter().map(Into::into).collect(),
        time_frames: e.time_frames,
        web_socket: e.web_socket,
        feed_interval: Duration::from_millis(e.feed_interval_ms),
    }
}
