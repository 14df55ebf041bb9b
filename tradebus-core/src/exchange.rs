//! Per-exchange shared state handed to domain producers.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use time::OffsetDateTime;
use tradebus_sdk::objects::market::BookLevel;
use tradebus_sdk::objects::{ExchangeName, Symbol};

use crate::error::SymbolDataError;

/// Mutable per-symbol market state shared by the producers of one exchange.
pub trait SymbolData: Send + Sync {
    /// Replace the order book snapshot of `symbol`.
    fn handle_order_book_update(
        &self,
        symbol: &Symbol,
        asks: &[BookLevel],
        bids: &[BookLevel],
    ) -> Result<(), SymbolDataError>;
}

/// Latest order book of one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBookSnapshot {
    pub asks: Vec<BookLevel>,
    pub bids: Vec<BookLevel>,
    pub updated_at: OffsetDateTime,
}

impl OrderBookSnapshot {
    pub fn best_ask(&self) -> Option<&BookLevel> {
        self.asks.iter().min_by_key(|level| level.price)
    }

    pub fn best_bid(&self) -> Option<&BookLevel> {
        self.bids.iter().max_by_key(|level| level.price)
    }
}

/// In-memory [`SymbolData`].
///
/// Rejects crossed books. When `symbols` is non-empty, updates for any other
/// symbol are rejected too.
#[derive(Debug, Default)]
pub struct SymbolDataStore {
    symbols: Vec<Symbol>,
    order_books: RwLock<HashMap<Symbol, OrderBookSnapshot>>,
}

impl SymbolDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store accepting updates for `symbols` only.
    pub fn with_symbols(symbols: Vec<Symbol>) -> Self {
        Self {
            symbols,
            order_books: RwLock::default(),
        }
    }

    pub fn order_book(&self, symbol: &str) -> Option<OrderBookSnapshot> {
        self.order_books
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(symbol)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.order_books
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SymbolData for SymbolDataStore {
    fn handle_order_book_update(
        &self,
        symbol: &Symbol,
        asks: &[BookLevel],
        bids: &[BookLevel],
    ) -> Result<(), SymbolDataError> {
        if !self.symbols.is_empty() && !self.symbols.contains(symbol) {
            return Err(SymbolDataError::UnknownSymbol(symbol.clone()));
        }
        let snapshot = OrderBookSnapshot {
            asks: asks.to_vec(),
            bids: bids.to_vec(),
            updated_at: OffsetDateTime::now_utc(),
        };
        if let (Some(ask), Some(bid)) = (snapshot.best_ask(), snapshot.best_bid())
            && bid.price >= ask.price
        {
            return Err(SymbolDataError::CrossedBook {
                symbol: symbol.clone(),
                best_bid: bid.price,
                best_ask: ask.price,
            });
        }
        self.order_books
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(symbol.clone(), snapshot);
        Ok(())
    }
}

/// What the producers of one exchange share.
#[derive(Clone)]
pub struct ExchangeContext {
    pub name: ExchangeName,
    pub symbol_data: Arc<dyn SymbolData>,
}

impl ExchangeContext {
    pub fn new(name: impl Into<ExchangeName>, symbol_data: Arc<dyn SymbolData>) -> Self {
        Self {
            name: name.into(),
            symbol_data,
        }
    }
}

impl std::fmt::Debug for ExchangeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeContext")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn level(price: i64) -> BookLevel {
        BookLevel::new(Decimal::new(price, 0), Decimal::ONE)
    }

    #[test]
    fn test_stores_latest_snapshot() {
        let store = SymbolDataStore::new();
        let symbol = Symbol::from("BTC/USDT");
        store
            .handle_order_book_update(&symbol, &[level(101), level(102)], &[level(100)])
            .unwrap();
        store
            .handle_order_book_update(&symbol, &[level(105)], &[level(99), level(103)])
            .unwrap();

        let book = store.order_book("BTC/USDT").unwrap();
        assert_eq!(book.best_ask(), Some(&level(105)));
        assert_eq!(book.best_bid(), Some(&level(103)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_rejects_crossed_book() {
        let store = SymbolDataStore::new();
        let symbol = Symbol::from("BTC/USDT");
        let err = store
            .handle_order_book_update(&symbol, &[level(100)], &[level(100)])
            .unwrap_err();
        assert!(matches!(err, SymbolDataError::CrossedBook { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_rejects_unknown_symbol() {
        let store = SymbolDataStore::with_symbols(vec!["BTC/USDT".into()]);
        let err = store
            .handle_order_book_update(&Symbol::from("ETH/BTC"), &[], &[])
            .unwrap_err();
        assert!(matches!(err, SymbolDataError::UnknownSymbol(_)));
    }
}
