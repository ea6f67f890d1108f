//! Fixed internal <-> exchange symbol table

use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Errors building an instrument mapping
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("instrument table is empty")]
    Empty,
    #[error("empty symbol in instrument table (internal: {internal:?}, exchange: {exchange:?})")]
    EmptySymbol { internal: String, exchange: String },
    #[error("exchange symbol {0} is mapped more than once")]
    DuplicateExchangeSymbol(String),
    #[error("internal symbol {0} is mapped more than once")]
    DuplicateInternalSymbol(String),
}

/// Bidirectional association between internal symbols (BTC-USD) and
/// exchange-native symbols (btcusdt).
///
/// Built once and never mutated afterwards, so it is shared behind an `Arc`
/// without locking.
#[derive(Debug, Clone)]
pub struct InstrumentMapping {
    to_exchange: BTreeMap<String, String>,
    to_internal: HashMap<String, String>,
}

impl InstrumentMapping {
    /// Build from (internal, exchange) pairs. Exchange symbols are lower-cased.
    pub fn new<I, K, V>(pairs: I) -> Result<Self, MappingError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut to_exchange = BTreeMap::new();
        let mut to_internal = HashMap::new();

        for (internal, exchange) in pairs {
            let internal = internal.into();
            let exchange = exchange.into().to_lowercase();
            if internal.is_empty() || exchange.is_empty() {
                return Err(MappingError::EmptySymbol { internal, exchange });
            }
            if to_exchange.contains_key(&internal) {
                return Err(MappingError::DuplicateInternalSymbol(internal));
            }
            if to_internal.insert(exchange.clone(), internal.clone()).is_some() {
                return Err(MappingError::DuplicateExchangeSymbol(exchange));
            }
            to_exchange.insert(internal, exchange);
        }

        if to_exchange.is_empty() {
            return Err(MappingError::Empty);
        }

        Ok(Self {
            to_exchange,
            to_internal,
        })
    }

    /// Map an exchange symbol back to the internal one, ignoring case
    pub fn internal_symbol(&self, exchange_symbol: &str) -> Option<&str> {
        self.to_internal
            .get(&exchange_symbol.to_lowercase())
            .map(String::as_str)
    }

    /// Exchange symbol for an internal symbol
    pub fn exchange_symbol(&self, internal_symbol: &str) -> Option<&str> {
        self.to_exchange.get(internal_symbol).map(String::as_str)
    }

    /// Internal symbols in sorted order
    pub fn internal_symbols(&self) -> impl Iterator<Item = &str> {
        self.to_exchange.keys().map(String::as_str)
    }

    /// Exchange symbols, sorted
    pub fn exchange_symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.to_internal.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }

    pub fn len(&self) -> usize {
        self.to_exchange.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_exchange.is_empty()
    }
}

/// Instruments tracked when no table is configured
pub fn default_instruments() -> BTreeMap<String, String> {
    [
        ("BTC-USD", "btcusdt"),
        ("ETH-USD", "ethusdt"),
        ("SOL-USD", "solusdt"),
        ("ADA-USD", "adausdt"),
        ("XRP-USD", "xrpusdt"),
    ]
    .into_iter()
    .map(|(internal, exchange)| (internal.to_string(), exchange.to_string()))
    .collect()
}
