//! Websocket connector lookup.
//!
//! Connectors are registered explicitly at startup. An exchange resolves to
//! the first registered connector whose predicate accepts its name.

use std::sync::Arc;
use tracing::debug;
use tradebus_sdk::config::ExchangeConfig;
use tradebus_sdk::objects::{ChannelName, WebsocketFeed, feeds_for_channel};

/// A websocket client able to serve some feeds of an exchange.
pub trait WebsocketConnector: Send + Sync {
    fn name(&self) -> &str;

    /// Feeds this connector can subscribe to.
    fn feeds(&self) -> &[WebsocketFeed];

    /// Whether at least one feed serving `channel` is available.
    fn supports_channel(&self, channel: ChannelName) -> bool {
        feeds_for_channel(channel)
            .iter()
            .any(|feed| self.feeds().contains(feed))
    }
}

type Predicate = Box<dyn Fn(&str) -> bool + Send + Sync>;
type Constructor = Box<dyn Fn(&ExchangeConfig) -> Arc<dyn WebsocketConnector> + Send + Sync>;

struct Entry {
    name: String,
    handles: Predicate,
    build: Constructor,
}

#[derive(Default)]
pub struct ConnectorTable {
    entries: Vec<Entry>,
}

impl ConnectorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connector constructor for the exchanges accepted by
    /// `handles`.
    pub fn register<H, B>(&mut self, name: impl Into<String>, handles: H, build: B)
    where
        H: Fn(&str) -> bool + Send + Sync + 'static,
        B: Fn(&ExchangeConfig) -> Arc<dyn WebsocketConnector> + Send + Sync + 'static,
    {
        self.entries.push(Entry {
            name: name.into(),
            handles: Box::new(handles),
            build: Box::new(build),
        });
    }

    /// Build the connector of `exchange`, if any handles it and websockets
    /// are not disabled for it.
    pub fn resolve(&self, exchange: &ExchangeConfig) -> Option<Arc<dyn WebsocketConnector>> {
        if !exchange.check_web_socket_config() {
            debug!(exchange = %exchange.name, "Websocket disabled by configuration");
            return None;
        }
        let entry = self.entries.iter().find(|e| (e.handles)(exchange.name.as_str()))?;
        debug!(exchange = %exchange.name, connector = %entry.name, "Websocket connector resolved");
        Some((entry.build)(exchange))
    }

    /// Build the connector registered as `name`, whatever the exchange.
    pub fn get(&self, name: &str, exchange: &ExchangeConfig) -> Option<Arc<dyn WebsocketConnector>> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| (e.build)(exchange))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }
}
