//! HTTP surface over a populated cache

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use pricing_hub::api::{router, AssetRequest, ErrorBody};
use pricing_hub::cache::PriceCache;
use pricing_hub::feed::{PriceRecord, BINANCE_SOURCE};
use std::collections::HashMap;
use tower::ServiceExt;

async fn seeded_cache() -> PriceCache {
    let cache = PriceCache::new();
    cache
        .update(PriceRecord::new("BTC-USD", 65000.5, BINANCE_SOURCE))
        .await;
    cache
        .update(PriceRecord::new("ETH-USD", 3500.0, BINANCE_SOURCE))
        .await;
    cache
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_get_all_prices() {
    let app = router(seeded_cache().await);

    let response = app
        .oneshot(Request::get("/v1/prices").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let prices: HashMap<String, PriceRecord> = body_json(response).await;
    assert_eq!(prices.len(), 2);
    assert_eq!(prices["BTC-USD"].price, 65000.5);
}

#[tokio::test]
async fn test_get_all_prices_empty_cache() {
    let app = router(PriceCache::new());

    let response = app
        .oneshot(Request::get("/v1/prices").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let prices: HashMap<String, PriceRecord> = body_json(response).await;
    assert!(prices.is_empty());
}

#[tokio::test]
async fn test_get_one_price() {
    let app = router(seeded_cache().await);

    let response = app
        .oneshot(Request::get("/v1/prices/ETH-USD").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["symbol"], "ETH-USD");
    assert_eq!(json["price"], 3500.0);
    assert_eq!(json["source"], "Binance");
    assert_eq!(json["change24h"], 0.0);
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_unknown_symbol_is_404() {
    let app = router(seeded_cache().await);

    let response = app
        .oneshot(Request::get("/v1/prices/DOGE-USD").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.error, "price not found for symbol: DOGE-USD");
}

#[tokio::test]
async fn test_manage_assets_echoes_request() {
    let app = router(PriceCache::new());

    let response = app
        .oneshot(
            Request::post("/v1/manageAssets")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"symbol":"DOGE-USD","provider":"binance","providerSymbol":"dogeusdt","enabled":true}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let echoed: AssetRequest = body_json(response).await;
    assert_eq!(echoed.symbol, "DOGE-USD");
    assert_eq!(echoed.provider_symbol, "dogeusdt");
    assert!(echoed.enabled);
}

#[tokio::test]
async fn test_manage_assets_rejects_malformed_body() {
    let app = router(PriceCache::new());

    let response = app
        .oneshot(
            Request::post("/v1/manageAssets")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.error, "Invalid request body");
}
