//! Builds the full channel set of one exchange.

use kanau::processor::Processor;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{info, warn};
use tradebus_sdk::config::ChannelSettings;
use tradebus_sdk::objects::{ChannelName, ChannelPayload, ExchangeName};

use super::order_book::OrderBookProducer;
use crate::channel::Channel;
use crate::error::ChannelError;
use crate::exchange::ExchangeContext;
use crate::producer::ExchangeProducer;
use crate::registry::ChannelRegistry;

/// The producers feeding the channels of one exchange.
pub struct ExchangeProducers {
    exchange: ExchangeName,
    order_book: Arc<OrderBookProducer>,
    relays: BTreeMap<ChannelName, Arc<ExchangeProducer>>,
}

impl ExchangeProducers {
    pub fn exchange(&self) -> &ExchangeName {
        &self.exchange
    }

    pub fn order_book(&self) -> &Arc<OrderBookProducer> {
        &self.order_book
    }

    /// The relay producer of `name`. `None` for `OrderBook`, which has its
    /// own producer.
    pub fn relay(&self, name: ChannelName) -> Option<&Arc<ExchangeProducer>> {
        self.relays.get(&name)
    }

    /// Route an upstream payload to the producer of its channel.
    pub async fn push(&self, payload: ChannelPayload) {
        match payload {
            ChannelPayload::OrderBook(update) => {
                self.order_book
                    .push(update.symbol, update.asks, update.bids)
                    .await;
            }
            payload => match self.relays.get(&payload.channel()) {
                Some(relay) => relay.push(payload).await,
                None => warn!(
                    exchange = %self.exchange,
                    channel = %payload.channel(),
                    "No producer for payload, dropped"
                ),
            },
        }
    }
}

impl Processor<ChannelPayload> for ExchangeProducers {
    type Output = ();
    type Error = Infallible;

    async fn process(&self, payload: ChannelPayload) -> Result<(), Infallible> {
        self.push(payload).await;
        Ok(())
    }
}

/// Create and register one channel per [`ChannelName`] for the exchange of
/// `context`, each with its producer attached.
///
/// All or nothing: if any channel fails to register, the channels already
/// registered by this call are unregistered again.
pub async fn create_exchange_channels(
    context: &ExchangeContext,
    registry: &ChannelRegistry,
    settings: &ChannelSettings,
) -> Result<ExchangeProducers, ChannelError> {
    let mut registered = Vec::with_capacity(ChannelName::ALL.len());
    let mut order_book = None;
    let mut relays = BTreeMap::new();

    for name in ChannelName::ALL {
        let channel = Arc::new(Channel::new(context.name.clone(), name, settings));
        if let Err(e) = registry.register(Arc::clone(&channel)).await {
            for name in registered {
                registry.unregister(name, &context.name).await;
            }
            return Err(e);
        }
        registered.push(name);

        if name == ChannelName::OrderBook {
            let producer = Arc::new(OrderBookProducer::new(
                Arc::clone(&channel),
                context.clone(),
            ));
            channel.register_producer(producer.clone()).await;
            order_book = Some(producer);
        } else {
            let producer = Arc::new(ExchangeProducer::new(Arc::clone(&channel)));
            channel.register_producer(producer.clone()).await;
            relays.insert(name, producer);
        }
    }

    let order_book = order_book.ok_or_else(|| ChannelError::ChannelNotFound {
        exchange: context.name.clone(),
        channel: ChannelName::OrderBook,
    })?;
    info!(exchange = %context.name, channels = registered.len(), "Exchange channels created");
    Ok(ExchangeProducers {
        exchange: context.name.clone(),
        order_book,
        relays,
    })
}
