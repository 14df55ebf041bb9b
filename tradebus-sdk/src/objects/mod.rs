pub mod account;
pub mod channels;
pub mod feeds;
pub mod market;
pub mod payload;

pub use channels::{ChannelName, ExchangeName, Symbol, TimeFrame};
pub use feeds::{WebsocketFeed, feeds_for_channel};
pub use payload::ChannelPayload;
