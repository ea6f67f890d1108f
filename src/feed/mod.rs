//! Price feed module
//!
//! Ingestion managers turn an upstream source into normalized
//! [`PriceRecord`]s pushed onto a bounded queue:
//! - Binance combined ticker stream (live)
//! - Random-walk generator (synthetic, no network)

mod backoff;
mod binance;
mod mapping;
mod synthetic;
mod types;

pub use backoff::{BackoffPolicy, Reconnector};
pub use binance::{decode_frame, stream_url, BinanceIngestion, BINANCE_STREAM_URL};
pub use mapping::{default_instruments, InstrumentMapping, MappingError};
pub use synthetic::SyntheticIngestion;
pub use types::{ConnectionState, PriceRecord, BINANCE_SOURCE, SYNTHETIC_SOURCE};

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

/// Lifecycle shared by every ingestion source
#[async_trait]
pub trait IngestionManager: Send {
    /// Spawn ingestion into `tx` and return immediately
    fn start(&mut self, tx: mpsc::Sender<PriceRecord>);

    /// Signal shutdown and wait for every spawned task to exit.
    ///
    /// No record is pushed after this resolves.
    async fn stop(&mut self);
}

/// Resolves once shutdown is requested or the controlling side is gone
pub(crate) async fn wait_for_stop(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}
