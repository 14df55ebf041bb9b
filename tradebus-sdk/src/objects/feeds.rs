//! Websocket feeds and the channels they serve.

use serde::{Deserialize, Serialize};

use super::channels::ChannelName;

/// A stream an exchange websocket connector can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebsocketFeed {
    Ticker,
    MiniTicker,
    Trades,
    Liquidations,
    L2Book,
    L3Book,
    BookTicker,
    Kline,
    Candle,
    Trade,
    Orders,
    MarkPrice,
    Portfolio,
    Position,
    Funding,
}

/// Websocket feeds that can populate `channel`.
///
/// Empty for channels that are only ever fed by REST polling or by the
/// trading engine itself (`BalanceProfitability`, `Time`).
pub const fn feeds_for_channel(channel: ChannelName) -> &'static [WebsocketFeed] {
    match channel {
        ChannelName::Ticker => &[WebsocketFeed::Ticker],
        ChannelName::MiniTicker => &[WebsocketFeed::MiniTicker],
        ChannelName::RecentTrades => &[WebsocketFeed::Trades],
        ChannelName::Liquidations => &[WebsocketFeed::Liquidations],
        ChannelName::OrderBook => &[WebsocketFeed::L2Book, WebsocketFeed::L3Book],
        ChannelName::OrderBookTicker => &[WebsocketFeed::BookTicker],
        ChannelName::Kline => &[WebsocketFeed::Kline],
        ChannelName::Ohlcv => &[WebsocketFeed::Candle],
        ChannelName::Trades => &[WebsocketFeed::Trade],
        ChannelName::Orders => &[WebsocketFeed::Orders],
        ChannelName::MarkPrice => &[WebsocketFeed::MarkPrice],
        ChannelName::Balance => &[WebsocketFeed::Portfolio],
        ChannelName::Positions => &[WebsocketFeed::Position],
        ChannelName::Funding => &[WebsocketFeed::Funding],
        ChannelName::BalanceProfitability | ChannelName::Time => &[],
    }
}
