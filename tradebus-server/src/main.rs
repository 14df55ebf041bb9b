//! tradebus server
//!
//! Runs the exchange channel engine for the configured exchanges, fed by a
//! simulated market data source, and exposes channel status over HTTP.

mod config;
mod feed;
mod monitor;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::ConfigLoader;
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use tradebus_core::config::ConfigStore;
use tradebus_core::{ChannelRegistry, ExchangeContext, SymbolDataStore, create_exchange_channels};

/// How long logging consumers get to flush their queues on shutdown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// tradebus - exchange channel engine
#[derive(Parser, Debug)]
#[command(name = "tradebus-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./tradebus.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Emit logs as JSON lines
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing(args.json_logs);

    tracing::info!("Starting tradebus-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let listen_addr = loaded_config.server.listen;
    let registry = Arc::new(ChannelRegistry::new());
    let display = ConfigStore::new(loaded_config.display);
    let connectors = feed::connector_table();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Channels, logging consumers and feed of every exchange
    let mut consumers = Vec::new();
    let mut feeds = Vec::new();
    for exchange in &loaded_config.exchanges {
        let context = ExchangeContext::new(
            exchange.name.clone(),
            Arc::new(SymbolDataStore::with_symbols(exchange.symbols.clone())),
        );
        let producers =
            create_exchange_channels(&context, &registry, &loaded_config.channels).await?;
        consumers.extend(monitor::attach(&registry, exchange, display.clone()).await?);
        feeds.push(feed::spawn(
            exchange.clone(),
            Arc::new(producers),
            &connectors,
            shutdown_rx.clone(),
        ));
    }
    tracing::info!(
        exchanges = loaded_config.exchanges.len(),
        consumers = consumers.len(),
        "Channel engine ready"
    );

    let display_watcher = monitor::watch_display(display.clone(), shutdown_rx.clone());
    let state = AppState::new(Arc::clone(&registry), display);

    // Spawn config reload handler (listens for SIGHUP)
    let shutdown_notify = spawn_config_reload_handler(state.clone(), config_loader);

    let router = build_router(state);

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Stop producing, let queued payloads through, then tear channels down
    shutdown_tx.send_replace(true);
    if let Err(e) = display_watcher.await {
        tracing::error!("Display watcher failed: {}", e);
    }
    for handle in feeds {
        if let Err(e) = handle.await {
            tracing::error!("Feed task failed: {}", e);
        }
    }
    let drained = async {
        for consumer in &consumers {
            consumer.drained().await;
        }
    };
    if tokio::time::timeout(DRAIN_TIMEOUT, drained).await.is_err() {
        tracing::warn!("Consumers did not drain in time, discarding queued payloads");
    }
    for exchange in registry.exchanges().await {
        registry.unregister_exchange(&exchange).await;
    }
    shutdown_notify.notify_one();
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
