//! Downstream notification port
//!
//! Called after every committed cache update. Delivery is best effort: the
//! dispatcher logs failures and moves on.

use crate::feed::PriceRecord;
use async_trait::async_trait;

/// Sink for committed price updates
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publish one committed update
    async fn publish(&self, record: &PriceRecord) -> anyhow::Result<()>;
}

/// Placeholder sink until a message bus is wired in
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn publish(&self, record: &PriceRecord) -> anyhow::Result<()> {
        tracing::trace!(symbol = %record.symbol, price = record.price, "Price update published");
        Ok(())
    }
}
