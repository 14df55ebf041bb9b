//! OrderBook channel producer.
//!
//! A thin relay: the payload carries the exchange, the symbol and the raw
//! ask/bid sequences. Before relaying, the producer refreshes the shared
//! per-symbol snapshot, but only if some consumer would receive the update.

use kanau::processor::Processor;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{error, trace};
use tradebus_sdk::objects::market::{BookLevel, OrderBookUpdate};
use tradebus_sdk::objects::{ChannelPayload, Symbol};

use crate::channel::Channel;
use crate::error::{ChannelError, PerformError};
use crate::exchange::ExchangeContext;
use crate::filter::FilterSet;
use crate::producer::{ExchangeProducer, Producer, ProducerState};

/// One order book update as received from upstream.
#[derive(Debug, Clone)]
pub struct OrderBookPush {
    pub symbol: Symbol,
    pub asks: Vec<BookLevel>,
    pub bids: Vec<BookLevel>,
}

pub struct OrderBookProducer {
    base: ExchangeProducer,
    context: ExchangeContext,
}

impl OrderBookProducer {
    pub fn new(channel: Arc<Channel>, context: ExchangeContext) -> Self {
        Self {
            base: ExchangeProducer::new(channel),
            context,
        }
    }

    pub fn channel(&self) -> &Arc<Channel> {
        self.base.channel()
    }

    /// Upstream entry point. Errors of this update cycle are logged and
    /// swallowed.
    pub async fn push(&self, symbol: Symbol, asks: Vec<BookLevel>, bids: Vec<BookLevel>) {
        if let Err(e) = self.perform(symbol, asks, bids).await {
            error!(producer = self.base.name(), error = %e, "Order book update failed");
        }
    }

    /// Refresh shared state and relay, when anyone listens.
    ///
    /// Returns the number of consumers the update was enqueued into, `0`
    /// when no consumer matches. In that case the shared snapshot is left
    /// untouched.
    pub async fn perform(
        &self,
        symbol: Symbol,
        asks: Vec<BookLevel>,
        bids: Vec<BookLevel>,
    ) -> Result<usize, PerformError> {
        // an exact-symbol target matches both wildcard and symbol consumers
        let target = FilterSet::symbol(&symbol);
        if !self.channel().has_matching_consumers(&target).await {
            trace!(producer = self.base.name(), %symbol, "No matching consumer, skipped");
            return Ok(0);
        }
        self.context
            .symbol_data
            .handle_order_book_update(&symbol, &asks, &bids)?;
        Ok(self.send(symbol, asks, bids).await?)
    }

    pub async fn send(
        &self,
        symbol: Symbol,
        asks: Vec<BookLevel>,
        bids: Vec<BookLevel>,
    ) -> Result<usize, ChannelError> {
        let update = OrderBookUpdate {
            exchange: self.context.name.clone(),
            symbol,
            asks,
            bids,
        };
        self.base.send(ChannelPayload::OrderBook(update)).await
    }
}

impl Producer for OrderBookProducer {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn state(&self) -> &ProducerState {
        self.base.state()
    }
}

impl Processor<OrderBookPush> for OrderBookProducer {
    type Output = ();
    type Error = Infallible;

    async fn process(&self, update: OrderBookPush) -> Result<(), Infallible> {
        self.push(update.symbol, update.asks, update.bids).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ConsumerFilterSpec;
    use crate::consumer::queue_sink;
    use crate::exchange::SymbolDataStore;
    use rust_decimal::Decimal;
    use tokio_stream::StreamExt;
    use tradebus_sdk::config::ChannelSettings;
    use tradebus_sdk::objects::ChannelName;

    fn level(price: i64) -> BookLevel {
        BookLevel::new(Decimal::new(price, 0), Decimal::ONE)
    }

    fn producer() -> (OrderBookProducer, Arc<SymbolDataStore>) {
        let store = Arc::new(SymbolDataStore::new());
        let channel = Arc::new(Channel::new(
            "binance",
            ChannelName::OrderBook,
            &ChannelSettings::default(),
        ));
        let context = ExchangeContext::new("binance", store.clone());
        (OrderBookProducer::new(channel, context), store)
    }

    #[tokio::test]
    async fn test_perform_without_consumers_is_a_no_op() {
        let (producer, store) = producer();
        let sent = producer
            .perform("BTC/USDT".into(), vec![level(101)], vec![level(100)])
            .await
            .unwrap();
        assert_eq!(sent, 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_perform_relays_raw_levels() {
        let (producer, store) = producer();
        let (sink, mut stream) = queue_sink();
        producer
            .channel()
            .new_consumer(sink, ConsumerFilterSpec::symbol("BTC/USDT"))
            .await
            .unwrap();

        let sent = producer
            .perform("BTC/USDT".into(), vec![level(101)], vec![level(100)])
            .await
            .unwrap();
        assert_eq!(sent, 1);
        assert!(store.order_book("BTC/USDT").is_some());

        let expected = ChannelPayload::OrderBook(OrderBookUpdate {
            exchange: "binance".into(),
            symbol: "BTC/USDT".into(),
            asks: vec![level(101)],
            bids: vec![level(100)],
        });
        assert_eq!(stream.next().await, Some(expected));
    }

    #[tokio::test]
    async fn test_symbol_data_failure_skips_send() {
        let (producer, store) = producer();
        let (sink, _stream) = queue_sink();
        let consumer = producer
            .channel()
            .new_consumer(sink, ConsumerFilterSpec::all())
            .await
            .unwrap();

        let err = producer
            .perform("BTC/USDT".into(), vec![level(100)], vec![level(101)])
            .await
            .unwrap_err();
        assert!(matches!(err, PerformError::SymbolData(_)));
        assert!(store.is_empty());
        assert_eq!(consumer.pending(), 0);

        // swallowed on the push path
        producer
            .push("BTC/USDT".into(), vec![level(100)], vec![level(101)])
            .await;
    }
}
