//! WebSocket stream client
//!
//! Connects to a streaming endpoint and reads text frames. Reconnection is
//! left to the caller so the backoff policy can live with the feed.

mod client;
mod types;

pub use client::{WsClient, WsConnection};
pub use types::{FrameStream, StreamConnector, WsError};
