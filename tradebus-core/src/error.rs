//! Error types of the channel engine.
//!
//! Structural errors ([`ChannelError`]) are returned to the caller.
//! Per-update errors ([`SinkError`], [`SymbolDataError`], [`PerformError`])
//! are logged and absorbed where the single update is handled.

use thiserror::Error;
use tradebus_sdk::objects::{ChannelName, ExchangeName, Symbol};

use crate::filter::FilterKey;

#[derive(Debug, Error)]
pub enum ChannelError {
    /// The (exchange, channel) pair is already registered.
    #[error("channel {channel} already exists on {exchange}")]
    DuplicateChannel {
        exchange: ExchangeName,
        channel: ChannelName,
    },

    /// The (exchange, channel) pair is not registered.
    #[error("channel {channel} not found on {exchange}")]
    ChannelNotFound {
        exchange: ExchangeName,
        channel: ChannelName,
    },

    /// The consumer has been stopped and cannot accept payloads anymore.
    #[error("consumer stopped")]
    ConsumerStopped,

    #[error("consumer already running")]
    ConsumerAlreadyRunning,

    /// A consumer must name a value for this filter key on this channel.
    #[error("consumers of {channel} must set a {key} filter")]
    MissingFilter { channel: ChannelName, key: FilterKey },

    /// A payload was sent into a channel of another kind.
    #[error("{payload} payload sent into {channel} channel")]
    PayloadMismatch {
        channel: ChannelName,
        payload: ChannelName,
    },
}

/// Failure reported by a consumer sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The downstream queue has been closed.
    #[error("sink closed")]
    Closed,

    #[error("{0}")]
    Failed(String),
}

impl SinkError {
    pub fn failed(reason: impl Into<String>) -> Self {
        SinkError::Failed(reason.into())
    }
}

/// Failure while updating shared per-symbol state.
#[derive(Debug, Error)]
pub enum SymbolDataError {
    #[error("crossed order book on {symbol}: best bid {best_bid} >= best ask {best_ask}")]
    CrossedBook {
        symbol: Symbol,
        best_bid: rust_decimal::Decimal,
        best_ask: rust_decimal::Decimal,
    },

    #[error("unknown symbol: {0}")]
    UnknownSymbol(Symbol),
}

/// Failure of one `perform` cycle of a domain producer.
#[derive(Debug, Error)]
pub enum PerformError {
    #[error("symbol data error: {0}")]
    SymbolData(#[from] SymbolDataError),

    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),
}
