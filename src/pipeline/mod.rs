//! Update pipeline
//!
//! The bounded queue between ingestion and the cache, and the single task
//! that drains it.

mod dispatcher;

pub use dispatcher::{DispatchStats, Dispatcher, DEFAULT_NOTIFY_CAPACITY, DEFAULT_NOTIFY_TIMEOUT};

use crate::feed::PriceRecord;
use tokio::sync::mpsc;

/// Default queue depth between ingestion and the dispatcher
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Create the bounded update queue
pub fn update_queue(
    capacity: usize,
) -> (mpsc::Sender<PriceRecord>, mpsc::Receiver<PriceRecord>) {
    mpsc::channel(capacity)
}
