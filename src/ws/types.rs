//! WebSocket types

use async_trait::async_trait;
use thiserror::Error;

/// WebSocket errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WsError {
    /// Connect or handshake failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// Mid-stream read failure
    #[error("Read failed: {0}")]
    ReadFailed(String),
    /// Send failed
    #[error("Send failed: {0}")]
    SendFailed(String),
}

/// Opens streaming connections
#[async_trait]
pub trait StreamConnector: Send + Sync {
    /// Connect and complete the handshake
    async fn connect(&self, url: &str) -> Result<Box<dyn FrameStream>, WsError>;
}

/// A live streaming connection
#[async_trait]
pub trait FrameStream: Send {
    /// Wait for the next text frame.
    ///
    /// Returns `Ok(None)` once the server has closed the stream.
    async fn next_text(&mut self) -> Result<Option<String>, WsError>;

    /// Close the connection, best effort
    async fn close(&mut self);
}
