//! Exchange configuration.

use crate::objects::{ExchangeName, Symbol, TimeFrame};
use std::time::Duration;

/// Per-exchange configuration.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    /// Exchange identifier, used as the channel registry namespace.
    pub name: ExchangeName,
    /// Symbols traded on this exchange.
    pub symbols: Vec<Symbol>,
    /// Candle periods watched on this exchange.
    pub time_frames: Vec<TimeFrame>,
    /// Explicit websocket switch. `None` leaves the decision to the
    /// connector table, `Some(false)` force-disables websocket feeds.
    pub web_socket: Option<bool>,
    /// Interval between two market data refreshes.
    pub feed_interval: Duration,
}

impl ExchangeConfig {
    /// Whether websocket feeds were explicitly turned off for this exchange.
    pub fn force_disable_web_socket(&self) -> bool {
        self.web_socket == Some(false)
    }

    /// Whether a websocket connector may be used for this exchange.
    pub fn check_web_socket_config(&self) -> bool {
        !self.force_disable_web_socket()
    }
}
