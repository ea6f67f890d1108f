//! tokio-tungstenite backed stream client

use super::types::{FrameStream, StreamConnector, WsError};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};

/// Opens WebSocket connections with a bounded handshake
#[derive(Debug, Clone)]
pub struct WsClient {
    connect_timeout: Duration,
}

impl WsClient {
    pub fn new() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Set the handshake timeout
    pub fn connect_timeout(mut self, d: Duration) -> Self {
        self.connect_timeout = d;
        self
    }
}

impl Default for WsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StreamConnector for WsClient {
    async fn connect(&self, url: &str) -> Result<Box<dyn FrameStream>, WsError> {
        tracing::info!(url = %url, "Connecting to WebSocket");

        let (ws_stream, _response) = tokio::time::timeout(self.connect_timeout, connect_async(url))
            .await
            .map_err(|_| WsError::ConnectionFailed("handshake timed out".into()))?
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

        tracing::info!("WebSocket connected");
        Ok(Box::new(WsConnection { inner: ws_stream }))
    }
}

/// One open WebSocket connection
pub struct WsConnection {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl FrameStream for WsConnection {
    async fn next_text(&mut self) -> Result<Option<String>, WsError> {
        loop {
            match self.inner.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Ping(data))) => {
                    self.inner
                        .send(Message::Pong(data))
                        .await
                        .map_err(|e| WsError::SendFailed(e.to_string()))?;
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(?frame, "Received close frame");
                    return Ok(None);
                }
                // Ticker streams are text only
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(WsError::ReadFailed(e.to_string())),
                None => return Err(WsError::ReadFailed("Stream ended unexpectedly".into())),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.inner.close(None).await {
            tracing::debug!(error = %e, "WebSocket close failed");
        }
    }
}
