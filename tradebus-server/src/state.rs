//! Application state shared across all request handlers.

use std::sync::Arc;
use tradebus_core::ChannelRegistry;
use tradebus_core::config::{ConfigStore, DisplaySettings};

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Every exchange channel of the process.
    pub registry: Arc<ChannelRegistry>,
    /// Display settings (can be reloaded via SIGHUP).
    pub display: ConfigStore<DisplaySettings>,
}

impl AppState {
    pub fn new(registry: Arc<ChannelRegistry>, display: ConfigStore<DisplaySettings>) -> Self {
        Self { registry, display }
    }
}
