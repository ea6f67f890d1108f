//! Last-price cache
//!
//! Holds exactly one [`PriceRecord`] per symbol. Reads run concurrently; the
//! dispatcher is the only writer and replaces whole records, so a reader never
//! sees half of an update.

use crate::feed::PriceRecord;
use crate::telemetry::names;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Cache lookup errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("price not found for symbol: {symbol}")]
    NotFound { symbol: String },
}

/// Shared handle to the in-memory price table.
///
/// Clones point at the same table; pass one to the dispatcher and one to the
/// query surface.
#[derive(Debug, Clone, Default)]
pub struct PriceCache {
    prices: Arc<RwLock<HashMap<String, PriceRecord>>>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Independent copy of every current record
    pub async fn get_all(&self) -> HashMap<String, PriceRecord> {
        let prices = self.prices.read().await;
        prices.clone()
    }

    /// Current record for `symbol`
    pub async fn get_one(&self, symbol: &str) -> Result<PriceRecord, CacheError> {
        let prices = self.prices.read().await;
        prices
            .get(symbol)
            .cloned()
            .ok_or_else(|| CacheError::NotFound {
                symbol: symbol.to_string(),
            })
    }

    /// Overwrite the entry for `record.symbol`
    pub async fn update(&self, record: PriceRecord) {
        let mut prices = self.prices.write().await;
        prices.insert(record.symbol.clone(), record);
        metrics::gauge!(names::CACHE_SYMBOLS).set(prices.len() as f64);
    }

    /// Number of symbols with at least one committed update
    pub async fn len(&self) -> usize {
        self.prices.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.prices.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::BINANCE_SOURCE;

    fn record(symbol: &str, price: f64) -> PriceRecord {
        PriceRecord::new(symbol, price, BINANCE_SOURCE)
    }

    #[tokio::test]
    async fn test_update_then_get_one() {
        let cache = PriceCache::new();
        let btc = record("BTC-USD", 65000.0);

        cache.update(btc.clone()).await;

        assert_eq!(cache.get_one("BTC-USD").await.unwrap(), btc);
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let cache = PriceCache::new();
        for price in [65000.0, 65010.0, 65005.0] {
            cache.update(record("BTC-USD", price)).await;
        }

        assert_eq!(cache.get_one("BTC-USD").await.unwrap().price, 65005.0);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_missing_symbol_is_not_found() {
        let cache = PriceCache::new();
        cache.update(record("BTC-USD", 1.0)).await;

        let err = cache.get_one("DOGE-USD").await.unwrap_err();
        assert_eq!(
            err,
            CacheError::NotFound {
                symbol: "DOGE-USD".to_string()
            }
        );
        assert_eq!(err.to_string(), "price not found for symbol: DOGE-USD");
    }

    #[tokio::test]
    async fn test_snapshot_is_isolated() {
        let cache = PriceCache::new();
        cache.update(record("BTC-USD", 65000.0)).await;

        let snapshot = cache.get_all().await;
        cache.update(record("BTC-USD", 70000.0)).await;
        cache.update(record("ETH-USD", 3500.0)).await;

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["BTC-USD"].price, 65000.0);
        assert_eq!(cache.get_all().await.len(), 2);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let cache = PriceCache::new();
        let reader = cache.clone();
        assert!(reader.is_empty().await);

        cache.update(record("SOL-USD", 150.0)).await;
        assert_eq!(reader.get_one("SOL-USD").await.unwrap().price, 150.0);
    }
}
