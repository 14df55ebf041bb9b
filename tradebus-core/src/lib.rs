//! The exchange channel engine.
//!
//! Every exchange gets one [`Channel`] per [`ChannelName`]. A channel owns
//! its producers and its consumers; producers ask the channel which
//! consumers match a payload at emission time, and the channel pauses its
//! producers whenever nobody listens.
//!
//! [`ChannelName`]: tradebus_sdk::objects::ChannelName

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod channel;
pub mod channels;
pub mod config;
pub mod connectors;
pub mod consumer;
pub mod error;
pub mod exchange;
pub mod filter;
pub mod producer;
pub mod registry;

pub use channel::{Channel, ChannelStatus, ConsumerFilterSpec};
pub use channels::{ExchangeProducers, OrderBookProducer, create_exchange_channels};
pub use consumer::{Consumer, Sink, callback, queue_sink};
pub use error::{ChannelError, PerformError, SinkError, SymbolDataError};
pub use exchange::{ExchangeContext, SymbolData, SymbolDataStore};
pub use filter::{FilterKey, FilterSet, FilterValue};
pub use producer::{ExchangeProducer, Producer};
pub use registry::ChannelRegistry;
