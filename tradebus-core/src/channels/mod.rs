//! Exchange channel kinds with their own producer, and the factory wiring a
//! full channel set for one exchange.

mod factory;
pub mod order_book;

pub use factory::{ExchangeProducers, create_exchange_channels};
pub use order_book::{OrderBookProducer, OrderBookPush};
