//! Random-walk price generator
//!
//! Produces the same records as the live feed without touching the network.
//! Each instrument gets its own task that sleeps a random 500-2000ms, nudges
//! its price by at most +/-0.1% and pushes a record.

use super::mapping::InstrumentMapping;
use super::types::SYNTHETIC_SOURCE;
use super::{wait_for_stop, IngestionManager, PriceRecord};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Full swing of one tick as a fraction of price (+/-0.1%)
const MAX_SWING: f64 = 0.002;

/// Synthetic ingestion over a fixed symbol set
pub struct SyntheticIngestion {
    symbols: Vec<String>,
    tick_ms: RangeInclusive<u64>,
    seed: Option<u64>,
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl SyntheticIngestion {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
            tick_ms: 500..=2000,
            seed: None,
            shutdown_tx,
            handles: vec![],
        }
    }

    /// One generator per internal symbol of the mapping
    pub fn from_mapping(mapping: &InstrumentMapping) -> Self {
        Self::new(mapping.internal_symbols())
    }

    /// Make every generator deterministic
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Override the per-tick sleep range in milliseconds. Inverted bounds are swapped.
    pub fn tick_interval_ms(mut self, range: RangeInclusive<u64>) -> Self {
        let (a, b) = range.into_inner();
        self.tick_ms = a.min(b)..=a.max(b);
        self
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }
}

#[async_trait]
impl IngestionManager for SyntheticIngestion {
    fn start(&mut self, tx: mpsc::Sender<PriceRecord>) {
        if !self.handles.is_empty() {
            tracing::warn!("Synthetic ingestion already started");
            return;
        }
        tracing::info!(instruments = self.symbols.len(), "Starting synthetic ingestion");

        self.shutdown_tx.send_replace(false);
        for (i, symbol) in self.symbols.iter().enumerate() {
            let rng = match self.seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(i as u64)),
                None => StdRng::from_entropy(),
            };
            let generator = Generator::new(symbol.clone(), self.tick_ms.clone(), rng);
            let shutdown_rx = self.shutdown_tx.subscribe();
            let tx = tx.clone();
            self.handles
                .push(tokio::spawn(generator.run(tx, shutdown_rx)));
        }
    }

    async fn stop(&mut self) {
        tracing::info!("Stopping synthetic ingestion");
        self.shutdown_tx.send_replace(true);

        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Synthetic generator panicked");
            }
        }
    }
}

/// Random walk for one instrument
struct Generator {
    symbol: String,
    price: f64,
    tick_ms: RangeInclusive<u64>,
    rng: StdRng,
}

impl Generator {
    fn new(symbol: String, tick_ms: RangeInclusive<u64>, mut rng: StdRng) -> Self {
        let price = match symbol.as_str() {
            "BTC-USD" => 65000.0,
            "ETH-USD" => 3500.0,
            _ => 1000.0 + rng.gen::<f64>() * 50000.0,
        };
        Self {
            symbol,
            price,
            tick_ms,
            rng,
        }
    }

    fn step(&mut self) -> f64 {
        let u: f64 = self.rng.gen();
        self.price += (u - 0.5) * self.price * MAX_SWING;
        self.price
    }

    async fn run(mut self, tx: mpsc::Sender<PriceRecord>, mut shutdown_rx: watch::Receiver<bool>) {
        loop {
            let delay = Duration::from_millis(self.rng.gen_range(self.tick_ms.clone()));
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = wait_for_stop(&mut shutdown_rx) => break,
            }

            let record = PriceRecord::new(self.symbol.clone(), self.step(), SYNTHETIC_SOURCE);
            tokio::select! {
                sent = tx.send(record) => {
                    if sent.is_err() {
                        break;
                    }
                }
                _ = wait_for_stop(&mut shutdown_rx) => break,
            }
        }
        tracing::debug!(symbol = %self.symbol, "Synthetic generator exited");
    }
}
