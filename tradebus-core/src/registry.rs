//! Channel registry.
//!
//! Maps (exchange, channel name) to the shared [`Channel`] instance. The
//! registry is an explicit value: build one at startup, share it behind an
//! `Arc`, pass it wherever channels are looked up.
//!
//! Locking is per exchange. The outer map is write-locked only to create or
//! remove an exchange namespace; channel insertion and lookup lock that
//! namespace alone under a shared outer guard, so two exchanges never
//! contend with each other.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use tradebus_sdk::objects::{ChannelName, ExchangeName};

use crate::channel::Channel;
use crate::error::ChannelError;

type Namespace = RwLock<BTreeMap<ChannelName, Arc<Channel>>>;

#[derive(Default)]
pub struct ChannelRegistry {
    exchanges: RwLock<HashMap<ExchangeName, Arc<Namespace>>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    async fn namespace(&self, exchange: &str) -> Option<Arc<Namespace>> {
        self.exchanges.read().await.get(exchange).cloned()
    }

    /// Register a channel under its own exchange and name.
    ///
    /// Fails with [`ChannelError::DuplicateChannel`] if the pair is taken;
    /// the existing channel is left untouched.
    pub async fn register(&self, channel: Arc<Channel>) -> Result<(), ChannelError> {
        loop {
            {
                // the outer read guard keeps the namespace from being removed
                // by `unregister_exchange` while the channel goes in
                let exchanges = self.exchanges.read().await;
                if let Some(namespace) = exchanges.get(channel.exchange()) {
                    let mut channels = namespace.write().await;
                    if channels.contains_key(&channel.name()) {
                        return Err(ChannelError::DuplicateChannel {
                            exchange: channel.exchange().clone(),
                            channel: channel.name(),
                        });
                    }
                    debug!(exchange = %channel.exchange(), channel = %channel.name(), "Channel registered");
                    channels.insert(channel.name(), channel);
                    return Ok(());
                }
            }
            self.exchanges
                .write()
                .await
                .entry(channel.exchange().clone())
                .or_default();
        }
    }

    /// The channel registered under (`exchange`, `name`).
    pub async fn lookup(
        &self,
        name: ChannelName,
        exchange: &str,
    ) -> Result<Arc<Channel>, ChannelError> {
        let not_found = || ChannelError::ChannelNotFound {
            exchange: exchange.into(),
            channel: name,
        };
        let namespace = self.namespace(exchange).await.ok_or_else(not_found)?;
        let channel = namespace.read().await.get(&name).cloned();
        channel.ok_or_else(not_found)
    }

    /// Remove and stop a channel. Removing a missing entry is a no-op and
    /// returns `false`.
    pub async fn unregister(&self, name: ChannelName, exchange: &str) -> bool {
        let Some(namespace) = self.namespace(exchange).await else {
            return false;
        };
        let removed = namespace.write().await.remove(&name);
        match removed {
            Some(channel) => {
                channel.stop().await;
                debug!(exchange, channel = %name, "Channel unregistered");
                true
            }
            None => false,
        }
    }

    /// Remove and stop every channel of an exchange. Returns how many
    /// channels were removed.
    pub async fn unregister_exchange(&self, exchange: &str) -> usize {
        let Some(namespace) = self.exchanges.write().await.remove(exchange) else {
            return 0;
        };
        let channels = std::mem::take(&mut *namespace.write().await);
        let count = channels.len();
        for channel in channels.into_values() {
            channel.stop().await;
        }
        info!(exchange, channels = count, "Exchange channels removed");
        count
    }

    /// Registered exchanges, sorted.
    pub async fn exchanges(&self) -> Vec<ExchangeName> {
        let mut exchanges: Vec<_> = self.exchanges.read().await.keys().cloned().collect();
        exchanges.sort();
        exchanges
    }

    /// Channel names registered for `exchange`, in declaration order.
    pub async fn channel_names(&self, exchange: &str) -> Vec<ChannelName> {
        match self.namespace(exchange).await {
            Some(namespace) => namespace.read().await.keys().copied().collect(),
            None => Vec::new(),
        }
    }

    /// Channels registered for `exchange`, in declaration order.
    pub async fn channels(&self, exchange: &str) -> Vec<Arc<Channel>> {
        match self.namespace(exchange).await {
            Some(namespace) => namespace.read().await.values().cloned().collect(),
            None => Vec::new(),
        }
    }
}
