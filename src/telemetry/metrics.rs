//! Prometheus metrics

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Counter and gauge names recorded by the pipeline
pub mod names {
    pub const FRAMES_RECEIVED: &str = "pricing_frames_received_total";
    pub const FRAMES_DROPPED: &str = "pricing_frames_dropped_total";
    pub const CONNECT_FAILURES: &str = "pricing_connect_failures_total";
    pub const UPDATES_COMMITTED: &str = "pricing_updates_committed_total";
    pub const NOTIFY_FAILURES: &str = "pricing_notify_failures_total";
    pub const NOTIFY_DROPPED: &str = "pricing_notify_dropped_total";
    pub const CACHE_SYMBOLS: &str = "pricing_cache_symbols";
}

/// Install the global recorder and serve `/metrics` on `port`
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    describe();
    tracing::info!(address = %addr, "Prometheus exporter listening");
    Ok(())
}

fn describe() {
    metrics::describe_counter!(names::FRAMES_RECEIVED, "Text frames read from the exchange stream");
    metrics::describe_counter!(
        names::FRAMES_DROPPED,
        "Frames dropped as undecodable or for untracked symbols"
    );
    metrics::describe_counter!(names::CONNECT_FAILURES, "Failed stream connect attempts");
    metrics::describe_counter!(names::UPDATES_COMMITTED, "Records committed to the price cache");
    metrics::describe_counter!(names::NOTIFY_FAILURES, "Failed or timed out downstream notifications");
    metrics::describe_counter!(
        names::NOTIFY_DROPPED,
        "Notifications skipped because the notifier queue was full"
    );
    metrics::describe_gauge!(names::CACHE_SYMBOLS, "Symbols currently held in the price cache");
}
