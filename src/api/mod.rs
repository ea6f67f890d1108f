//! HTTP query surface
//!
//! Read-only views over the [`PriceCache`](crate::cache::PriceCache):
//! - `GET /v1/prices` all current prices
//! - `GET /v1/prices/:symbol` one price, 404 if never seen
//! - `POST /v1/manageAssets` acknowledge an asset tracking request

mod routes;

pub use routes::{ApiError, AssetRequest, ErrorBody};

use crate::cache::PriceCache;
use axum::Router;
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the full router with CORS and request tracing
pub fn router(cache: PriceCache) -> Router {
    Router::new()
        .nest("/v1", routes::v1_routes(cache))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve `router` on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, cache: PriceCache, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "HTTP server listening");

    axum::serve(listener, router(cache))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}
