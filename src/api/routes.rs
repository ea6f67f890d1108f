//! `/v1` price routes

use crate::cache::{CacheError, PriceCache};
use crate::feed::PriceRecord;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Error body returned by every route
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

/// Route-level errors mapped onto HTTP statuses
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::NotFound { .. } => ApiError::NotFound(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

/// Asset tracking request. Acknowledged only; the instrument table is fixed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetRequest {
    pub symbol: String,
    pub provider: String,
    pub provider_symbol: String,
    pub enabled: bool,
}

pub fn v1_routes(cache: PriceCache) -> Router {
    Router::new()
        .route("/prices", get(get_prices))
        .route("/prices/:symbol", get(get_price))
        .route("/manageAssets", post(manage_assets))
        .with_state(cache)
}

async fn get_prices(State(cache): State<PriceCache>) -> Json<HashMap<String, PriceRecord>> {
    Json(cache.get_all().await)
}

async fn get_price(
    State(cache): State<PriceCache>,
    Path(symbol): Path<String>,
) -> Result<Json<PriceRecord>, ApiError> {
    Ok(Json(cache.get_one(&symbol).await?))
}

async fn manage_assets(
    payload: Result<Json<AssetRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AssetRequest>), ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected manageAssets body");
        ApiError::BadRequest("Invalid request body".to_string())
    })?;

    // TODO: register with the ingestion manager once the instrument table becomes a swappable registry
    tracing::info!(symbol = %request.symbol, enabled = request.enabled, "Asset tracking request acknowledged");
    Ok((StatusCode::CREATED, Json(request)))
}
