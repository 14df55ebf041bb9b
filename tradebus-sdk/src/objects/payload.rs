//! The closed set of payloads carried by exchange channels.

use serde::{Deserialize, Serialize};

use super::account::{
    BalanceProfitabilityUpdate, BalanceUpdate, OrdersUpdate, PositionsUpdate, TimeUpdate,
    TradesUpdate,
};
use super::channels::{ChannelName, ExchangeName, Symbol, TimeFrame};
use super::market::{
    FundingUpdate, KlineUpdate, LiquidationsUpdate, MarkPriceUpdate, MiniTickerUpdate,
    OhlcvUpdate, OrderBookTickerUpdate, OrderBookUpdate, RecentTradesUpdate, TickerUpdate,
};

/// A payload delivered to consumers, one variant per [`ChannelName`].
///
/// Serialized as an adjacently tagged object so a downstream reader can
/// dispatch on `"channel"`:
///
/// ```json
/// {"channel":"OrderBook","data":{"exchange":"binance","symbol":"BTC/USDT", ...}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "data")]
pub enum ChannelPayload {
    Ticker(TickerUpdate),
    MiniTicker(MiniTickerUpdate),
    #[serde(rename = "RecentTrade")]
    RecentTrades(RecentTradesUpdate),
    Liquidations(LiquidationsUpdate),
    OrderBook(OrderBookUpdate),
    OrderBookTicker(OrderBookTickerUpdate),
    Kline(KlineUpdate),
    #[serde(rename = "OHLCV")]
    Ohlcv(OhlcvUpdate),
    MarkPrice(MarkPriceUpdate),
    Funding(FundingUpdate),
    Trades(TradesUpdate),
    Orders(OrdersUpdate),
    Balance(BalanceUpdate),
    BalanceProfitability(BalanceProfitabilityUpdate),
    Positions(PositionsUpdate),
    Time(TimeUpdate),
}

impl ChannelPayload {
    /// The channel this payload belongs to.
    pub fn channel(&self) -> ChannelName {
        match self {
            ChannelPayload::Ticker(_) => ChannelName::Ticker,
            ChannelPayload::MiniTicker(_) => ChannelName::MiniTicker,
            ChannelPayload::RecentTrades(_) => ChannelName::RecentTrades,
            ChannelPayload::Liquidations(_) => ChannelName::Liquidations,
            ChannelPayload::OrderBook(_) => ChannelName::OrderBook,
            ChannelPayload::OrderBookTicker(_) => ChannelName::OrderBookTicker,
            ChannelPayload::Kline(_) => ChannelName::Kline,
            ChannelPayload::Ohlcv(_) => ChannelName::Ohlcv,
            ChannelPayload::MarkPrice(_) => ChannelName::MarkPrice,
            ChannelPayload::Funding(_) => ChannelName::Funding,
            ChannelPayload::Trades(_) => ChannelName::Trades,
            ChannelPayload::Orders(_) => ChannelName::Orders,
            ChannelPayload::Balance(_) => ChannelName::Balance,
            ChannelPayload::BalanceProfitability(_) => ChannelName::BalanceProfitability,
            ChannelPayload::Positions(_) => ChannelName::Positions,
            ChannelPayload::Time(_) => ChannelName::Time,
        }
    }

    /// The exchange the payload originates from.
    pub fn exchange(&self) -> &ExchangeName {
        match self {
            ChannelPayload::Ticker(p) => &p.exchange,
            ChannelPayload::MiniTicker(p) => &p.exchange,
            ChannelPayload::RecentTrades(p) => &p.exchange,
            ChannelPayload::Liquidations(p) => &p.exchange,
            ChannelPayload::OrderBook(p) => &p.exchange,
            ChannelPayload::OrderBookTicker(p) => &p.exchange,
            ChannelPayload::Kline(p) => &p.exchange,
            ChannelPayload::Ohlcv(p) => &p.exchange,
            ChannelPayload::MarkPrice(p) => &p.exchange,
            ChannelPayload::Funding(p) => &p.exchange,
            ChannelPayload::Trades(p) => &p.exchange,
            ChannelPayload::Orders(p) => &p.exchange,
            ChannelPayload::Balance(p) => &p.exchange,
            ChannelPayload::BalanceProfitability(p) => &p.exchange,
            ChannelPayload::Positions(p) => &p.exchange,
            ChannelPayload::Time(p) => &p.exchange,
        }
    }

    /// Symbol routing key, if the payload is scoped to a symbol.
    pub fn symbol(&self) -> Option<&Symbol> {
        match self {
            ChannelPayload::Ticker(p) => Some(&p.symbol),
            ChannelPayload::MiniTicker(p) => Some(&p.symbol),
            ChannelPayload::RecentTrades(p) => Some(&p.symbol),
            ChannelPayload::Liquidations(p) => Some(&p.symbol),
            ChannelPayload::OrderBook(p) => Some(&p.symbol),
            ChannelPayload::OrderBookTicker(p) => Some(&p.symbol),
            ChannelPayload::Kline(p) => Some(&p.symbol),
            ChannelPayload::Ohlcv(p) => Some(&p.symbol),
            ChannelPayload::MarkPrice(p) => Some(&p.symbol),
            ChannelPayload::Funding(p) => Some(&p.symbol),
            ChannelPayload::Trades(p) => Some(&p.symbol),
            ChannelPayload::Orders(p) => Some(&p.symbol),
            ChannelPayload::Positions(p) => Some(&p.symbol),
            ChannelPayload::Balance(_)
            | ChannelPayload::BalanceProfitability(_)
            | ChannelPayload::Time(_) => None,
        }
    }

    /// Time frame routing key, if the payload is a candle.
    pub fn time_frame(&self) -> Option<TimeFrame> {
        match self {
            ChannelPayload::Kline(p) => Some(p.time_frame),
            ChannelPayload::Ohlcv(p) => Some(p.time_frame),
            _ => None,
        }
    }
}

macro_rules! impl_from_update {
    ($($update:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$update> for ChannelPayload {
                fn from(update: $update) -> Self {
                    ChannelPayload::$variant(update)
                }
            }
        )*
    };
}

impl_from_update! {
    TickerUpdate => Ticker,
    MiniTickerUpdate => MiniTicker,
    RecentTradesUpdate => RecentTrades,
    LiquidationsUpdate => Liquidations,
    OrderBookUpdate => OrderBook,
    OrderBookTickerUpdate => OrderBookTicker,
    KlineUpdate => Kline,
    OhlcvUpdate => Ohlcv,
    MarkPriceUpdate => MarkPrice,
    FundingUpdate => Funding,
    TradesUpdate => Trades,
    OrdersUpdate => Orders,
    BalanceUpdate => Balance,
    BalanceProfitabilityUpdate => BalanceProfitability,
    PositionsUpdate => Positions,
    TimeUpdate => Time,
}
