//! Private account payloads.
//!
//! Orders, trades, positions and balances are relayed as JSON objects: the
//! channel fabric does not interpret them, the account layer that produced
//! them owns their schema.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::channels::{ExchangeName, Symbol};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradesUpdate {
    pub exchange: ExchangeName,
    pub symbol: Symbol,
    pub trade: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdersUpdate {
    pub exchange: ExchangeName,
    pub symbol: Symbol,
    pub order: serde_json::Value,
    pub is_closed: bool,
    pub is_updated: bool,
    pub is_from_bot: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionsUpdate {
    pub exchange: ExchangeName,
    pub symbol: Symbol,
    pub position: serde_json::Value,
    pub is_closed: bool,
    pub is_updated: bool,
    pub is_from_bot: bool,
}

/// Portfolio snapshot. Not scoped to a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceUpdate {
    pub exchange: ExchangeName,
    pub balance: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceProfitabilityUpdate {
    pub exchange: ExchangeName,
    pub profitability: Decimal,
    pub profitability_percent: Decimal,
    pub market_profitability_percent: Decimal,
    pub initial_portfolio_current_profitability: Decimal,
}

/// Exchange clock tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeUpdate {
    pub exchange: ExchangeName,
    #[serde(with = "time::serde::timestamp")]
    pub timestamp: OffsetDateTime,
}
