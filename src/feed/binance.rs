//! Binance combined ticker stream ingestion

use super::backoff::{BackoffPolicy, Reconnector};
use super::mapping::InstrumentMapping;
use super::types::BINANCE_SOURCE;
use super::{wait_for_stop, ConnectionState, IngestionManager, PriceRecord};
use crate::telemetry::names;
use crate::ws::{FrameStream, StreamConnector, WsClient, WsError};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Binance combined-stream base URL
pub const BINANCE_STREAM_URL: &str = "wss://stream.binance.com:9443/stream";

const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Combined stream envelope: `{"stream": "btcusdt@ticker", "data": {...}}`
#[derive(Debug, Deserialize)]
struct CombinedFrame {
    #[serde(default)]
    stream: Option<String>,
    #[serde(default)]
    data: Option<TickerPayload>,
}

/// 24hr ticker payload, only the fields we use
#[derive(Debug, Default, Deserialize)]
struct TickerPayload {
    /// Symbol
    #[serde(rename = "s", default)]
    symbol: String,
    /// Last price
    #[serde(rename = "c", default)]
    last_price: NumOrText,
    /// Price change percent
    #[serde(rename = "P", default)]
    change_pct: NumOrText,
    /// Event time (milliseconds)
    #[serde(rename = "E", default)]
    event_time: NumOrText,
}

/// Binance sends numbers as strings in some payloads and as numbers in others
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumOrText {
    Num(f64),
    Text(String),
    Other(serde_json::Value),
}

impl Default for NumOrText {
    fn default() -> Self {
        NumOrText::Other(serde_json::Value::Null)
    }
}

impl NumOrText {
    /// Unparseable text and anything else coerce to zero
    fn as_f64(&self) -> f64 {
        match self {
            NumOrText::Num(n) => *n,
            NumOrText::Text(s) => s.trim().parse().unwrap_or(0.0),
            NumOrText::Other(_) => 0.0,
        }
    }
}

/// Build the combined-stream URL for every mapped instrument, sorted
pub fn stream_url(base_url: &str, mapping: &InstrumentMapping) -> String {
    let streams: Vec<String> = mapping
        .exchange_symbols()
        .into_iter()
        .map(|symbol| format!("{symbol}@ticker"))
        .collect();
    format!("{}?streams={}", base_url, streams.join("/"))
}

/// Decode one ticker frame into a record for a mapped instrument.
///
/// Returns `None` for anything that is not a ticker frame for a tracked symbol.
pub fn decode_frame(mapping: &InstrumentMapping, text: &str) -> Option<PriceRecord> {
    let frame: CombinedFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(error = %e, "Dropping undecodable frame");
            return None;
        }
    };
    let data = frame.data?;

    let Some(symbol) = mapping.internal_symbol(&data.symbol) else {
        tracing::trace!(stream = ?frame.stream, symbol = %data.symbol, "Dropping unmapped frame");
        return None;
    };

    let event_ms = data.event_time.as_f64() as i64;
    Some(PriceRecord {
        symbol: symbol.to_string(),
        price: data.last_price.as_f64(),
        timestamp: Utc.timestamp_millis_opt(event_ms).single().unwrap_or_default(),
        source: BINANCE_SOURCE.to_string(),
        change_24h: data.change_pct.as_f64(),
    })
}

/// Live ingestion from the Binance ticker stream.
///
/// One supervising task connects, listens and reconnects with exponential
/// backoff until [`IngestionManager::stop`] is called.
pub struct BinanceIngestion {
    base_url: String,
    mapping: Arc<InstrumentMapping>,
    policy: BackoffPolicy,
    connector: Arc<dyn StreamConnector>,
    shutdown_tx: watch::Sender<bool>,
    state_rx: watch::Receiver<ConnectionState>,
    state_tx: watch::Sender<ConnectionState>,
    handle: Option<JoinHandle<()>>,
}

impl BinanceIngestion {
    /// Create a manager using the production WebSocket client
    pub fn new(mapping: Arc<InstrumentMapping>) -> Self {
        Self::with_connector(mapping, Arc::new(WsClient::new()))
    }

    /// Create a manager over any stream connector
    pub fn with_connector(
        mapping: Arc<InstrumentMapping>,
        connector: Arc<dyn StreamConnector>,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        Self {
            base_url: BINANCE_STREAM_URL.to_string(),
            mapping,
            policy: BackoffPolicy::default(),
            connector,
            shutdown_tx,
            state_rx,
            state_tx,
            handle: None,
        }
    }

    /// Override the stream base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Override the reconnect backoff
    pub fn backoff(mut self, policy: BackoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Subscription URL this manager connects to
    pub fn url(&self) -> String {
        stream_url(&self.base_url, &self.mapping)
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }
}

#[async_trait]
impl IngestionManager for BinanceIngestion {
    fn start(&mut self, tx: mpsc::Sender<PriceRecord>) {
        if self.handle.is_some() {
            tracing::warn!("Binance ingestion already started");
            return;
        }
        tracing::info!(instruments = self.mapping.len(), "Starting Binance ingestion");

        self.shutdown_tx.send_replace(false);
        let supervisor = Supervisor {
            url: self.url(),
            mapping: Arc::clone(&self.mapping),
            connector: Arc::clone(&self.connector),
            reconnector: Reconnector::new(self.policy),
            state_tx: self.state_tx.clone(),
            shutdown_rx: self.shutdown_tx.subscribe(),
            tx,
        };
        self.handle = Some(tokio::spawn(supervisor.run()));
    }

    async fn stop(&mut self) {
        tracing::info!("Stopping Binance ingestion");
        self.shutdown_tx.send_replace(true);

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Binance ingestion task panicked");
            }
        }
    }
}

/// Why a listening session ended
#[derive(Debug)]
enum SessionEnd {
    Shutdown,
    ReceiverDropped,
    ClosedByServer,
    Failed(WsError),
}

/// State owned by the supervising task
struct Supervisor {
    url: String,
    mapping: Arc<InstrumentMapping>,
    connector: Arc<dyn StreamConnector>,
    reconnector: Reconnector,
    state_tx: watch::Sender<ConnectionState>,
    shutdown_rx: watch::Receiver<bool>,
    tx: mpsc::Sender<PriceRecord>,
}

impl Supervisor {
    async fn run(mut self) {
        loop {
            if *self.shutdown_rx.borrow() {
                break;
            }

            self.transition(Reconnector::begin_connect);
            let connected = tokio::select! {
                res = self.connector.connect(&self.url) => res,
                _ = wait_for_stop(&mut self.shutdown_rx) => break,
            };

            match connected {
                Ok(stream) => {
                    self.transition(Reconnector::on_connected);
                    tracing::info!("Binance ingestion listening");

                    match self.listen(stream).await {
                        SessionEnd::Shutdown => break,
                        SessionEnd::ReceiverDropped => {
                            tracing::debug!("Update receiver dropped, stopping ingestion");
                            break;
                        }
                        SessionEnd::ClosedByServer => {
                            tracing::warn!("Binance stream closed by server, reconnecting");
                        }
                        SessionEnd::Failed(e) => {
                            tracing::error!(error = %e, "Error reading from Binance stream, reconnecting");
                        }
                    }
                    self.transition(Reconnector::on_disconnected);
                }
                Err(e) => {
                    let delay = self.transition(Reconnector::on_connect_failed);
                    metrics::counter!(names::CONNECT_FAILURES).increment(1);
                    tracing::error!(
                        error = %e,
                        attempt = self.reconnector.failed_attempts(),
                        delay_ms = delay.as_millis() as u64,
                        "Failed to connect to Binance"
                    );

                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = wait_for_stop(&mut self.shutdown_rx) => break,
                    }
                }
            }
        }

        self.transition(Reconnector::on_stopped);
        tracing::info!("Binance ingestion stopped");
    }

    /// Read frames until the session ends, pushing decoded records downstream
    async fn listen(&mut self, mut stream: Box<dyn FrameStream>) -> SessionEnd {
        let end = loop {
            let frame = tokio::select! {
                frame = stream.next_text() => frame,
                _ = wait_for_stop(&mut self.shutdown_rx) => break SessionEnd::Shutdown,
            };

            let text = match frame {
                Ok(Some(text)) => text,
                Ok(None) => break SessionEnd::ClosedByServer,
                Err(e) => break SessionEnd::Failed(e),
            };
            metrics::counter!(names::FRAMES_RECEIVED).increment(1);

            let Some(record) = decode_frame(&self.mapping, &text) else {
                metrics::counter!(names::FRAMES_DROPPED).increment(1);
                continue;
            };

            // Blocks while the queue is full
            tokio::select! {
                sent = self.tx.send(record) => {
                    if sent.is_err() {
                        break SessionEnd::ReceiverDropped;
                    }
                }
                _ = wait_for_stop(&mut self.shutdown_rx) => break SessionEnd::Shutdown,
            }
        };

        if tokio::time::timeout(CLOSE_TIMEOUT, stream.close()).await.is_err() {
            tracing::debug!("Timed out closing Binance stream, dropping it");
        }
        end
    }

    fn transition<T>(&mut self, f: impl FnOnce(&mut Reconnector) -> T) -> T {
        let out = f(&mut self.reconnector);
        self.state_tx.send_replace(self.reconnector.state());
        out
    }
}
