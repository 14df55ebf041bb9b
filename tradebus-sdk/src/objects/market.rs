//! Public market data payloads.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::channels::{ExchangeName, Symbol, TimeFrame};

/// One price level of an order book side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Decimal,
    pub amount: Decimal,
}

impl BookLevel {
    pub fn new(price: Decimal, amount: Decimal) -> Self {
        Self { price, amount }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// A trade printed on the public tape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicTrade {
    pub price: Decimal,
    pub amount: Decimal,
    pub side: TradeSide,
    #[serde(with = "time::serde::timestamp")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    #[serde(with = "time::serde::timestamp")]
    pub open_time: OffsetDateTime,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticker {
    pub bid: Decimal,
    pub ask: Decimal,
    pub last: Decimal,
    pub base_volume: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerUpdate {
    pub exchange: ExchangeName,
    pub symbol: Symbol,
    pub ticker: Ticker,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiniTicker {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiniTickerUpdate {
    pub exchange: ExchangeName,
    pub symbol: Symbol,
    pub mini_ticker: MiniTicker,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentTradesUpdate {
    pub exchange: ExchangeName,
    pub symbol: Symbol,
    pub recent_trades: Vec<PublicTrade>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationsUpdate {
    pub exchange: ExchangeName,
    pub symbol: Symbol,
    pub liquidations: Vec<PublicTrade>,
}

/// A full order book snapshot, relayed as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookUpdate {
    pub exchange: ExchangeName,
    pub symbol: Symbol,
    pub asks: Vec<BookLevel>,
    pub bids: Vec<BookLevel>,
}

/// Best bid and ask only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookTickerUpdate {
    pub exchange: ExchangeName,
    pub symbol: Symbol,
    pub bid: BookLevel,
    pub ask: BookLevel,
}

/// An in-progress candle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KlineUpdate {
    pub exchange: ExchangeName,
    pub symbol: Symbol,
    pub time_frame: TimeFrame,
    pub kline: Candle,
}

/// A closed candle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OhlcvUpdate {
    pub exchange: ExchangeName,
    pub symbol: Symbol,
    pub time_frame: TimeFrame,
    pub candle: Candle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkPriceUpdate {
    pub exchange: ExchangeName,
    pub symbol: Symbol,
    pub mark_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingUpdate {
    pub exchange: ExchangeName,
    pub symbol: Symbol,
    pub funding_rate: Decimal,
    #[serde(with = "time::serde::timestamp")]
    pub next_funding_time: OffsetDateTime,
}
