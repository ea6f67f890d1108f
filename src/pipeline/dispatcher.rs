//! Single-consumer update dispatcher

use crate::cache::PriceCache;
use crate::feed::PriceRecord;
use crate::notify::Notifier;
use crate::telemetry::names;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

/// Default depth of the hand-off queue to the notifier
pub const DEFAULT_NOTIFY_CAPACITY: usize = 256;

/// Default upper bound on a single publish
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Dispatch counters
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchStats {
    pub committed: u64,
    /// Publishes that returned an error or timed out
    pub notify_failures: u64,
    /// Records never handed to the notifier because its queue was full
    pub notify_dropped: u64,
}

#[derive(Debug, Default)]
struct Counters {
    committed: AtomicU64,
    notify_failures: AtomicU64,
    notify_dropped: AtomicU64,
}

/// Drains the update queue into the cache, then notifies downstream.
///
/// The cache commit always happens first and is never undone. Publishing runs
/// on its own task behind a bounded queue, so a slow sink costs notifications,
/// never commits.
#[derive(Clone)]
pub struct Dispatcher {
    cache: PriceCache,
    notifier: Arc<dyn Notifier>,
    counters: Arc<Counters>,
    notify_capacity: usize,
    notify_timeout: Duration,
}

impl Dispatcher {
    pub fn new(cache: PriceCache, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            cache,
            notifier,
            counters: Arc::new(Counters::default()),
            notify_capacity: DEFAULT_NOTIFY_CAPACITY,
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
        }
    }

    /// Set the notifier hand-off queue depth (minimum 1)
    pub fn notify_capacity(mut self, capacity: usize) -> Self {
        self.notify_capacity = capacity.max(1);
        self
    }

    /// Set the per-publish timeout. Also bounds the notifier drain on exit.
    pub fn notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = timeout;
        self
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            committed: self.counters.committed.load(Ordering::Relaxed),
            notify_failures: self.counters.notify_failures.load(Ordering::Relaxed),
            notify_dropped: self.counters.notify_dropped.load(Ordering::Relaxed),
        }
    }

    /// Run [`Dispatcher::run`] on its own task
    pub fn spawn(&self, rx: mpsc::Receiver<PriceRecord>) -> JoinHandle<()> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.run(rx).await })
    }

    /// Consume until every sender is dropped and the queue is empty
    pub async fn run(&self, mut rx: mpsc::Receiver<PriceRecord>) {
        tracing::info!("Starting price update dispatcher");

        let (notify_tx, notify_rx) = mpsc::channel(self.notify_capacity);
        let mut publisher = tokio::spawn(self.clone().publish_loop(notify_rx));

        while let Some(record) = rx.recv().await {
            self.commit(&record).await;
            self.hand_off(&notify_tx, record);
        }

        drop(notify_tx);
        if tokio::time::timeout(self.notify_timeout, &mut publisher)
            .await
            .is_err()
        {
            tracing::warn!("Notifier did not drain in time, abandoning pending notifications");
            publisher.abort();
        }
        tracing::info!("Update queue closed, dispatcher exiting");
    }

    async fn commit(&self, record: &PriceRecord) {
        self.cache.update(record.clone()).await;
        self.counters.committed.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(names::UPDATES_COMMITTED).increment(1);
    }

    fn hand_off(&self, notify_tx: &mpsc::Sender<PriceRecord>, record: PriceRecord) {
        match notify_tx.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(record)) => {
                self.counters.notify_dropped.fetch_add(1, Ordering::Relaxed);
                metrics::counter!(names::NOTIFY_DROPPED).increment(1);
                tracing::warn!(symbol = %record.symbol, "Notifier queue full, skipping notification");
            }
            Err(TrySendError::Closed(record)) => {
                self.record_notify_failure(&record.symbol, "notifier task gone");
            }
        }
    }

    async fn publish_loop(self, mut notify_rx: mpsc::Receiver<PriceRecord>) {
        while let Some(record) = notify_rx.recv().await {
            match tokio::time::timeout(self.notify_timeout, self.notifier.publish(&record)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => self.record_notify_failure(&record.symbol, &e.to_string()),
                Err(_) => self.record_notify_failure(&record.symbol, "publish timed out"),
            }
        }
    }

    fn record_notify_failure(&self, symbol: &str, reason: &str) {
        self.counters.notify_failures.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(names::NOTIFY_FAILURES).increment(1);
        tracing::error!(error = %reason, symbol = %symbol, "Failed to publish price update");
    }
}
