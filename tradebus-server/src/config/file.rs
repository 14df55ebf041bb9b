//! TOML file configuration structures.
//!
//! These structs directly map to the `tradebus.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use tradebus_sdk::objects::{ChannelName, TimeFrame};

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub channels: ChannelsConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub exchanges: Vec<ExchangeConfig>,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port of the status surface (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

/// Channel engine section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelsConfig {
    /// Default consumer queue capacity, `0` for unbounded.
    #[serde(default)]
    pub queue_size: usize,
    /// Channels whose consumers must subscribe to an explicit symbol.
    #[serde(default)]
    pub symbol_required: Vec<ChannelName>,
}

/// Display section. Reloaded on SIGHUP.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub callbacks_logs: bool,
}

/// One connected exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub name: String,
    pub symbols: Vec<String>,
    #[serde(default)]
    pub time_frames: Vec<TimeFrame>,
    /// `false` force-disables websocket feeds for this exchange.
    #[serde(default)]
    pub web_socket: Option<bool>,
    #[serde(default = "default_feed_interval_ms")]
    pub feed_interval_ms: u64,
}

fn default_feed_interval_ms() -> u64 {
    1000
}
