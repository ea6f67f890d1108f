//! Serve command implementation

use crate::api;
use crate::cache::PriceCache;
use crate::config::{Config, FeedConfig, FeedMode};
use crate::feed::{BinanceIngestion, IngestionManager, InstrumentMapping, SyntheticIngestion};
use crate::notify::{LogNotifier, Notifier};
use crate::pipeline::{update_queue, DispatchStats, Dispatcher};
use anyhow::Context;
use clap::Args;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Use the random-walk feed instead of the exchange stream
    #[arg(long)]
    pub synthetic: bool,

    /// Override the HTTP port
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl ServeArgs {
    pub async fn execute(&self, mut config: Config) -> anyhow::Result<()> {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.synthetic {
            config.feed.mode = FeedMode::Synthetic;
        }

        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind HTTP listener on {addr}"))?;

        let stats = run_service(config, listener, shutdown_signal()).await?;
        tracing::info!(
            committed = stats.committed,
            notify_failures = stats.notify_failures,
            notify_dropped = stats.notify_dropped,
            "Service stopped"
        );
        Ok(())
    }
}

/// Run ingestion, dispatch and the HTTP surface until `shutdown` resolves.
///
/// Shutdown order: stop ingestion, stop HTTP (bounded by
/// `server.shutdown_timeout_secs`), then let the dispatcher drain the queue.
pub async fn run_service<F>(
    config: Config,
    listener: TcpListener,
    shutdown: F,
) -> anyhow::Result<DispatchStats>
where
    F: Future<Output = ()>,
{
    let mapping = Arc::new(config.feed.instrument_mapping()?);
    let cache = PriceCache::new();
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier::new());

    let (tx, rx) = update_queue(config.pipeline.queue_capacity);
    let dispatcher = Dispatcher::new(cache.clone(), notifier)
        .notify_capacity(config.pipeline.notify_capacity)
        .notify_timeout(Duration::from_millis(config.pipeline.notify_timeout_ms));
    let dispatcher_handle = dispatcher.spawn(rx);

    let mut ingestion = build_ingestion(&config.feed, mapping);
    ingestion.start(tx);

    let (http_stop_tx, http_stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(api::serve(listener, cache, async move {
        let _ = http_stop_rx.await;
    }));

    shutdown.await;
    tracing::info!("Shutting down service...");

    ingestion.stop().await;

    let _ = http_stop_tx.send(());
    let grace = Duration::from_secs(config.server.shutdown_timeout_secs);
    match tokio::time::timeout(grace, server).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "HTTP server failed"),
        Ok(Err(e)) => tracing::error!(error = %e, "HTTP server task panicked"),
        Err(_) => tracing::warn!(timeout_secs = grace.as_secs(), "HTTP server shutdown timed out"),
    }

    // Ingestion tasks held the only senders; the dispatcher drains and exits
    dispatcher_handle
        .await
        .context("Dispatcher task panicked")?;

    Ok(dispatcher.stats())
}

fn build_ingestion(
    feed: &FeedConfig,
    mapping: Arc<InstrumentMapping>,
) -> Box<dyn IngestionManager> {
    match feed.mode {
        FeedMode::Binance => Box::new(
            BinanceIngestion::new(mapping)
                .base_url(feed.ws_url.clone())
                .backoff(feed.backoff_policy()),
        ),
        FeedMode::Synthetic => Box::new(SyntheticIngestion::from_mapping(&mapping)),
    }
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
