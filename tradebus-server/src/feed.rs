//! Simulated exchange feed.
//!
//! Stands in for the exchange ingestion adapters: on every tick it pushes
//! random market data for each configured symbol through the exchange
//! producers until shutdown is signaled.

use rand::Rng;
use rust_decimal::Decimal;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use tradebus_core::channels::{ExchangeProducers, OrderBookPush};
use tradebus_core::config::ExchangeConfig;
use tradebus_core::connectors::{ConnectorTable, WebsocketConnector};
use tradebus_core::producer::Producer;
use tradebus_sdk::objects::account::TimeUpdate;
use tradebus_sdk::objects::market::{BookLevel, Candle, KlineUpdate, Ticker, TickerUpdate};
use tradebus_sdk::objects::{ChannelName, ChannelPayload, Symbol, TimeFrame, WebsocketFeed};

/// Book depth per side.
const DEPTH: i64 = 5;

/// Websocket connector of the simulated exchanges.
pub struct SimulatedConnector {
    feeds: Vec<WebsocketFeed>,
}

impl WebsocketConnector for SimulatedConnector {
    fn name(&self) -> &str {
        "simulated"
    }

    fn feeds(&self) -> &[WebsocketFeed] {
        &self.feeds
    }
}

/// Connectors known to this binary.
pub fn connector_table() -> ConnectorTable {
    let mut table = ConnectorTable::new();
    table.register(
        "simulated",
        |_| true,
        |_| {
            Arc::new(SimulatedConnector {
                feeds: vec![
                    WebsocketFeed::Ticker,
                    WebsocketFeed::L2Book,
                    WebsocketFeed::Kline,
                ],
            }) as Arc<dyn WebsocketConnector>
        },
    );
    table
}

/// Channels the feed of `exchange` serves.
///
/// With a websocket connector, whatever it supports; without one, only
/// what a REST poll would return.
fn served_channels(exchange: &ExchangeConfig, connectors: &ConnectorTable) -> Vec<ChannelName> {
    match connectors.resolve(exchange) {
        Some(connector) => ChannelName::ALL
            .into_iter()
            .filter(|&name| connector.supports_channel(name))
            .collect(),
        None => vec![ChannelName::Ticker],
    }
}

/// Random walk state of one symbol, in cents.
struct SymbolFeed {
    symbol: Symbol,
    mid: i64,
}

impl SymbolFeed {
    fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            mid: rand::rng().random_range(1_000..100_000) * 100,
        }
    }

    fn step(&mut self) {
        let delta = rand::rng().random_range(-50..=50);
        self.mid = (self.mid + delta).max(DEPTH + 1);
    }

    fn price(&self, offset: i64) -> Decimal {
        Decimal::new(self.mid + offset, 2)
    }

    fn order_book(&self) -> OrderBookPush {
        let amount = || Decimal::new(rand::rng().random_range(1..10_000), 3);
        OrderBookPush {
            symbol: self.symbol.clone(),
            asks: (1..=DEPTH)
                .map(|i| BookLevel::new(self.price(i), amount()))
                .collect(),
            bids: (1..=DEPTH)
                .map(|i| BookLevel::new(self.price(-i), amount()))
                .collect(),
        }
    }

    fn ticker(&self, exchange: &ExchangeConfig) -> ChannelPayload {
        ChannelPayload::Ticker(TickerUpdate {
            exchange: exchange.name.clone(),
            symbol: self.symbol.clone(),
            ticker: Ticker {
                bid: self.price(-1),
                ask: self.price(1),
                last: self.price(0),
                base_volume: Decimal::new(rand::rng().random_range(0..1_000_000), 2),
            },
        })
    }

    fn kline(&self, exchange: &ExchangeConfig, time_frame: TimeFrame, now: OffsetDateTime) -> ChannelPayload {
        let period = i64::from(time_frame.minutes()) * 60;
        let open_time = OffsetDateTime::from_unix_timestamp(now.unix_timestamp() / period * period)
            .unwrap_or(now);
        ChannelPayload::Kline(KlineUpdate {
            exchange: exchange.name.clone(),
            symbol: self.symbol.clone(),
            time_frame,
            kline: Candle {
                open_time,
                open: self.price(0),
                high: self.price(DEPTH),
                low: self.price(-DEPTH),
                close: self.price(0),
                volume: Decimal::new(rand::rng().random_range(0..1_000_000), 2),
            },
        })
    }
}

/// Spawn the feed task of one exchange.
pub fn spawn(
    exchange: ExchangeConfig,
    producers: Arc<ExchangeProducers>,
    connectors: &ConnectorTable,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let served = served_channels(&exchange, connectors);
    info!(exchange = %exchange.name, channels = ?served, "Starting simulated feed");

    tokio::spawn(async move {
        let mut symbols: Vec<SymbolFeed> = exchange
            .symbols
            .iter()
            .cloned()
            .map(SymbolFeed::new)
            .collect();
        let mut interval = tokio::time::interval(exchange.feed_interval);

        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }

                _ = interval.tick() => {
                    let now = OffsetDateTime::now_utc();
                    for feed in &mut symbols {
                        feed.step();
                    }
                    tick(&exchange, &producers, &served, &symbols, now).await;
                }
            }
        }
        debug!(exchange = %exchange.name, "Simulated feed stopped");
    })
}

async fn tick(
    exchange: &ExchangeConfig,
    producers: &ExchangeProducers,
    served: &[ChannelName],
    symbols: &[SymbolFeed],
    now: OffsetDateTime,
) {
    for feed in symbols {
        // paused producers: nobody listens, skip generating the book
        if served.contains(&ChannelName::OrderBook) && !producers.order_book().is_paused() {
            let OrderBookPush { symbol, asks, bids } = feed.order_book();
            producers.order_book().push(symbol, asks, bids).await;
        }
        if served.contains(&ChannelName::Ticker) {
            producers.push(feed.ticker(exchange)).await;
        }
        if served.contains(&ChannelName::Kline) {
            for &time_frame in &exchange.time_frames {
                producers.push(feed.kline(exchange, time_frame, now)).await;
            }
        }
    }
    producers
        .push(ChannelPayload::Time(TimeUpdate {
            exchange: exchange.name.clone(),
            timestamp: now,
        }))
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_stream::StreamExt;
    use tradebus_core::consumer::queue_sink;
    use tradebus_core::{
        ChannelRegistry, ConsumerFilterSpec, ExchangeContext, SymbolDataStore,
        create_exchange_channels,
    };
    use tradebus_sdk::config::ChannelSettings;

    fn exchange(web_socket: Option<bool>) -> ExchangeConfig {
        ExchangeConfig {
            name: "binance".into(),
            symbols: vec!["BTC/USDT".into()],
            time_frames: vec![TimeFrame::OneHour],
            web_socket,
            feed_interval: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_served_channels() {
        let table = connector_table();
        assert_eq!(
            served_channels(&exchange(None), &table),
            vec![ChannelName::Ticker, ChannelName::OrderBook, ChannelName::Kline]
        );
        assert_eq!(
            served_channels(&exchange(Some(false)), &table),
            vec![ChannelName::Ticker]
        );
    }

    #[test]
    fn test_generated_book_is_not_crossed() {
        let mut feed = SymbolFeed::new("BTC/USDT".into());
        for _ in 0..100 {
            feed.step();
            let book = feed.order_book();
            let best_ask = book.asks.iter().map(|l| l.price).min().unwrap();
            let best_bid = book.bids.iter().map(|l| l.price).max().unwrap();
            assert!(best_bid < best_ask);
            assert!(best_bid > Decimal::ZERO);
        }
    }

    #[tokio::test]
    async fn test_tick_pushes_through_producers() {
        let exchange = exchange(None);
        let registry = ChannelRegistry::new();
        let store = Arc::new(SymbolDataStore::with_symbols(exchange.symbols.clone()));
        let producers = create_exchange_channels(
            &ExchangeContext::new(exchange.name.clone(), Arc::<SymbolDataStore>::clone(&store)),
            &registry,
            &ChannelSettings::default(),
        )
        .await
        .unwrap();

        let mut streams = Vec::new();
        for name in [ChannelName::OrderBook, ChannelName::Kline, ChannelName::Time] {
            let channel = registry.lookup(name, &exchange.name).await.unwrap();
            let (sink, stream) = queue_sink();
            channel
                .new_consumer(sink, ConsumerFilterSpec::all())
                .await
                .unwrap();
            streams.push((name, stream));
        }

        let served = served_channels(&exchange, &connector_table());
        let symbols = vec![SymbolFeed::new("BTC/USDT".into())];
        tick(&exchange, &producers, &served, &symbols, OffsetDateTime::now_utc()).await;

        for (name, stream) in &mut streams {
            let payload = tokio::time::timeout(Duration::from_secs(1), stream.next())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(payload.channel(), *name);
        }
        assert!(store.order_book("BTC/USDT").is_some());
    }
}
