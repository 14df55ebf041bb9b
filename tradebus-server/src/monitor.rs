//! Logging consumers.
//!
//! Every exchange gets one consumer on each monitored channel. Each consumer
//! reads the display settings on every payload, so a SIGHUP reload turns the
//! output on or off without re-registering anything.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tradebus_core::config::{ConfigStore, DisplaySettings, ExchangeConfig};
use tradebus_core::consumer::callback;
use tradebus_core::{ChannelError, ChannelRegistry, Consumer, ConsumerFilterSpec, SinkError};
use tradebus_sdk::objects::{ChannelName, ChannelPayload};

/// Channels watched by the logging consumers.
pub const MONITORED_CHANNELS: [ChannelName; 4] = [
    ChannelName::Ticker,
    ChannelName::OrderBook,
    ChannelName::Kline,
    ChannelName::Time,
];

async fn log_payload(
    display: ConfigStore<DisplaySettings>,
    payload: ChannelPayload,
) -> Result<(), SinkError> {
    if !display.read().await.callbacks_logs {
        return Ok(());
    }
    let data = serde_json::to_string(&payload).map_err(|e| SinkError::failed(e.to_string()))?;
    tracing::info!(
        exchange = %payload.exchange(),
        channel = %payload.channel(),
        symbol = payload.symbol().map(|s| s.as_str()),
        "{}",
        data
    );
    Ok(())
}

/// Register the logging consumers of one exchange.
///
/// On channels requiring a symbol, one consumer per configured symbol is
/// registered; elsewhere a single all-symbols consumer.
pub async fn attach(
    registry: &ChannelRegistry,
    exchange: &ExchangeConfig,
    display: ConfigStore<DisplaySettings>,
) -> Result<Vec<Arc<Consumer>>, ChannelError> {
    let mut consumers = Vec::new();
    for name in MONITORED_CHANNELS {
        let channel = registry.lookup(name, &exchange.name).await?;
        let specs = if channel.symbol_required() {
            exchange
                .symbols
                .iter()
                .map(|symbol| ConsumerFilterSpec::symbol(symbol.clone()))
                .collect()
        } else {
            vec![ConsumerFilterSpec::all()]
        };
        for spec in specs {
            let display = display.clone();
            let sink = callback(move |payload| log_payload(display.clone(), payload));
            consumers.push(channel.new_consumer(sink, spec).await?);
        }
    }
    tracing::debug!(
        exchange = %exchange.name,
        consumers = consumers.len(),
        "Logging consumers attached"
    );
    Ok(consumers)
}

/// Spawn a task logging every display settings update the consumers pick
/// up. Ends on shutdown or once the store is gone.
pub fn watch_display(
    display: ConfigStore<DisplaySettings>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<u64> {
    let mut watcher = display.subscribe();
    tokio::spawn(async move {
        let mut applied = 0;
        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }

                version = watcher.changed() => {
                    let Ok(version) = version else {
                        break;
                    };
                    applied = version;
                    let callbacks_logs = display.read().await.callbacks_logs;
                    tracing::info!(
                        version,
                        callbacks_logs,
                        "Display settings applied to logging consumers"
                    );
                }
            }
        }
        applied
    })
}
