//! pricing-hub: live exchange prices, cached in memory and served over HTTP
//!
//! This library provides the core components for:
//! - Real-time ticker ingestion from Binance with reconnect backoff
//! - A synthetic random-walk feed for offline runs
//! - A bounded update queue drained by a single dispatcher
//! - A concurrent last-price cache
//! - Best-effort downstream notification
//! - An HTTP query surface
//! - Logging and Prometheus metrics

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod feed;
pub mod notify;
pub mod pipeline;
pub mod telemetry;
pub mod ws;
