//! Runtime configuration shared by the channel engine.
//!
//! Plain settings types live in `tradebus_sdk::config` and are re-exported
//! here; [`ConfigStore`] adds hot reload on top of them.

mod config_store;

pub use config_store::{ConfigStore, ConfigWatcher};
pub use tradebus_sdk::config::{ChannelSettings, DisplaySettings, ExchangeConfig, ServerConfig};
