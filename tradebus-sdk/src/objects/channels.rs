//! Channel names and routing vocabulary.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A market symbol such as `BTC/USDT`.
pub type Symbol = CompactString;

/// An exchange identifier such as `binance`.
pub type ExchangeName = CompactString;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown channel name: {0}")]
pub struct UnknownChannelName(pub String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown time frame: {0}")]
pub struct UnknownTimeFrame(pub String);

/// Every channel an exchange exposes.
///
/// The set is closed: an exchange gets exactly one channel per name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChannelName {
    Ticker,
    MiniTicker,
    #[serde(rename = "RecentTrade")]
    RecentTrades,
    Liquidations,
    OrderBook,
    OrderBookTicker,
    Kline,
    #[serde(rename = "OHLCV")]
    Ohlcv,
    MarkPrice,
    Funding,
    Trades,
    Orders,
    Balance,
    BalanceProfitability,
    Positions,
    Time,
}

impl ChannelName {
    pub const ALL: [ChannelName; 16] = [
        ChannelName::Ticker,
        ChannelName::MiniTicker,
        ChannelName::RecentTrades,
        ChannelName::Liquidations,
        ChannelName::OrderBook,
        ChannelName::OrderBookTicker,
        ChannelName::Kline,
        ChannelName::Ohlcv,
        ChannelName::MarkPrice,
        ChannelName::Funding,
        ChannelName::Trades,
        ChannelName::Orders,
        ChannelName::Balance,
        ChannelName::BalanceProfitability,
        ChannelName::Positions,
        ChannelName::Time,
    ];

    /// Canonical name, as used in logs and configuration files.
    pub const fn as_str(self) -> &'static str {
        match self {
            ChannelName::Ticker => "Ticker",
            ChannelName::MiniTicker => "MiniTicker",
            ChannelName::RecentTrades => "RecentTrade",
            ChannelName::Liquidations => "Liquidations",
            ChannelName::OrderBook => "OrderBook",
            ChannelName::OrderBookTicker => "OrderBookTicker",
            ChannelName::Kline => "Kline",
            ChannelName::Ohlcv => "OHLCV",
            ChannelName::MarkPrice => "MarkPrice",
            ChannelName::Funding => "Funding",
            ChannelName::Trades => "Trades",
            ChannelName::Orders => "Orders",
            ChannelName::Balance => "Balance",
            ChannelName::BalanceProfitability => "BalanceProfitability",
            ChannelName::Positions => "Positions",
            ChannelName::Time => "Time",
        }
    }

    /// Whether consumers of this channel are also filtered by time frame.
    pub const fn with_time_frame(self) -> bool {
        matches!(self, ChannelName::Kline | ChannelName::Ohlcv)
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelName {
    type Err = UnknownChannelName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChannelName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownChannelName(s.to_owned()))
    }
}

/// Candle periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeFrame {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "3m")]
    ThreeMinutes,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "2h")]
    TwoHours,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "12h")]
    TwelveHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
}

impl TimeFrame {
    pub const ALL: [TimeFrame; 12] = [
        TimeFrame::OneMinute,
        TimeFrame::ThreeMinutes,
        TimeFrame::FiveMinutes,
        TimeFrame::FifteenMinutes,
        TimeFrame::ThirtyMinutes,
        TimeFrame::OneHour,
        TimeFrame::TwoHours,
        TimeFrame::FourHours,
        TimeFrame::TwelveHours,
        TimeFrame::OneDay,
        TimeFrame::OneWeek,
        TimeFrame::OneMonth,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            TimeFrame::OneMinute => "1m",
            TimeFrame::ThreeMinutes => "3m",
            TimeFrame::FiveMinutes => "5m",
            TimeFrame::FifteenMinutes => "15m",
            TimeFrame::ThirtyMinutes => "30m",
            TimeFrame::OneHour => "1h",
            TimeFrame::TwoHours => "2h",
            TimeFrame::FourHours => "4h",
            TimeFrame::TwelveHours => "12h",
            TimeFrame::OneDay => "1d",
            TimeFrame::OneWeek => "1w",
            TimeFrame::OneMonth => "1M",
        }
    }

    /// Length of one candle in minutes. A month counts as 30 days.
    pub const fn minutes(self) -> u32 {
        match self {
            TimeFrame::OneMinute => 1,
            TimeFrame::ThreeMinutes => 3,
            TimeFrame::FiveMinutes => 5,
            TimeFrame::FifteenMinutes => 15,
            TimeFrame::ThirtyMinutes => 30,
            TimeFrame::OneHour => 60,
            TimeFrame::TwoHours => 120,
            TimeFrame::FourHours => 240,
            TimeFrame::TwelveHours => 720,
            TimeFrame::OneDay => 1_440,
            TimeFrame::OneWeek => 10_080,
            TimeFrame::OneMonth => 43_200,
        }
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeFrame {
    type Err = UnknownTimeFrame;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeFrame::ALL
            .into_iter()
            .find(|tf| tf.as_str() == s)
            .ok_or_else(|| UnknownTimeFrame(s.to_owned()))
    }
}
