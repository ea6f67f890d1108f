//! Price feed types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance tag for records decoded from the Binance ticker stream
pub const BINANCE_SOURCE: &str = "Binance";

/// Provenance tag for records produced by the random-walk generator
pub const SYNTHETIC_SOURCE: &str = "synthetic";

/// One normalized price observation for one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Internal instrument identifier (e.g., "BTC-USD")
    pub symbol: String,
    /// Last traded price
    pub price: f64,
    /// Observation time as reported by the source
    pub timestamp: DateTime<Utc>,
    /// Feed that produced the record
    pub source: String,
    /// 24h percentage change, zero when the source does not report one
    #[serde(rename = "change24h", default)]
    pub change_24h: f64,
}

impl PriceRecord {
    /// Create a record with no 24h change, stamped now
    pub fn new(symbol: impl Into<String>, price: f64, source: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp: Utc::now(),
            source: source.into(),
            change_24h: 0.0,
        }
    }
}

/// Lifecycle of one ingestion connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Listening,
    Stopped,
}
