//! Axum server setup and router configuration.

use crate::shutdown::shutdown_signal;
use crate::state::AppState;
use axum::extract::State;
use axum::{Json, Router, response::IntoResponse, routing::get};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tradebus_core::ChannelStatus;
use tradebus_sdk::objects::ExchangeName;

/// Build the main application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/channels", get(list_channels))
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Simple health check - returns OK if the server is running.
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct ExchangeChannels {
    exchange: ExchangeName,
    channels: Vec<ChannelStatus>,
}

/// Pause state and consumer count of every registered channel.
async fn list_channels(State(state): State<AppState>) -> impl IntoResponse {
    let mut exchanges = Vec::new();
    for exchange in state.registry.exchanges().await {
        let mut channels = Vec::new();
        for channel in state.registry.channels(&exchange).await {
            channels.push(channel.status().await);
        }
        exchanges.push(ExchangeChannels { exchange, channels });
    }
    Json(exchanges)
}

/// Run the server with graceful shutdown support.
pub async fn run_server(router: Router, addr: SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;
    use tradebus_core::config::{ConfigStore, DisplaySettings};
    use tradebus_core::{
        ChannelRegistry, ConsumerFilterSpec, ExchangeContext, SymbolDataStore,
        create_exchange_channels, queue_sink,
    };
    use tradebus_sdk::config::ChannelSettings;
    use tradebus_sdk::objects::ChannelName;

    async fn state() -> AppState {
        let registry = Arc::new(ChannelRegistry::new());
        create_exchange_channels(
            &ExchangeContext::new("binance", Arc::new(SymbolDataStore::new())),
            &registry,
            &ChannelSettings::default(),
        )
        .await
        .unwrap();
        AppState::new(registry, ConfigStore::new(DisplaySettings::default()))
    }

    async fn get_json(router: Router, uri: &str) -> serde_json::Value {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let body = get_json(build_router(state().await), "/health").await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_channels_report_pause_state() {
        let state = state().await;
        let ticker = state
            .registry
            .lookup(ChannelName::Ticker, "binance")
            .await
            .unwrap();
        let (sink, _stream) = queue_sink();
        ticker
            .new_consumer(sink, ConsumerFilterSpec::all())
            .await
            .unwrap();

        let body = get_json(build_router(state), "/channels").await;
        let exchanges = body.as_array().unwrap();
        assert_eq!(exchanges.len(), 1);
        assert_eq!(exchanges[0]["exchange"], "binance");
        let channels = exchanges[0]["channels"].as_array().unwrap();
        assert_eq!(channels.len(), ChannelName::ALL.len());
        for channel in channels {
            let is_ticker = channel["channel"] == "Ticker";
            assert_eq!(channel["is_paused"], !is_ticker);
            assert_eq!(channel["consumers"], u64::from(is_ticker));
        }
    }
}
