//! Ingestion through dispatch into the cache

use async_trait::async_trait;
use pricing_hub::cache::PriceCache;
use pricing_hub::feed::{
    default_instruments, BinanceIngestion, IngestionManager, InstrumentMapping, SyntheticIngestion,
    SYNTHETIC_SOURCE,
};
use pricing_hub::notify::LogNotifier;
use pricing_hub::pipeline::{update_queue, Dispatcher};
use pricing_hub::ws::{FrameStream, StreamConnector, WsError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Serves one connection with fixed frames, then idles
struct OneShotConnector {
    frames: Mutex<Option<Vec<String>>>,
}

#[async_trait]
impl StreamConnector for OneShotConnector {
    async fn connect(&self, _url: &str) -> Result<Box<dyn FrameStream>, WsError> {
        let frames = self.frames.lock().unwrap().take();
        match frames {
            Some(frames) => Ok(Box::new(IdleAfter {
                frames: frames.into(),
            })),
            None => std::future::pending().await,
        }
    }
}

struct IdleAfter {
    frames: VecDeque<String>,
}

#[async_trait]
impl FrameStream for IdleAfter {
    async fn next_text(&mut self) -> Result<Option<String>, WsError> {
        match self.frames.pop_front() {
            Some(frame) => Ok(Some(frame)),
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) {}
}

fn mapping() -> Arc<InstrumentMapping> {
    Arc::new(InstrumentMapping::new(default_instruments()).unwrap())
}

async fn wait_for_symbols(cache: &PriceCache, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while cache.len().await < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("cache never filled");
}

#[tokio::test]
async fn test_binance_frames_reach_cache() {
    let connector = Arc::new(OneShotConnector {
        frames: Mutex::new(Some(vec![
            r#"{"stream":"btcusdt@ticker","data":{}}"#.to_string(),
            "not json".to_string(),
            r#"{"stream":"dogeusdt@ticker","data":{"E":1704067200000,"s":"DOGEUSDT","c":"0.1","P":"0"}}"#
                .to_string(),
            r#"{"stream":"btcusdt@ticker","data":{"E":1704067200000,"s":"BTCUSDT","c":"65000.50","P":"1.25"}}"#
                .to_string(),
        ])),
    });

    let cache = PriceCache::new();
    let (tx, rx) = update_queue(16);
    let dispatcher = Dispatcher::new(cache.clone(), Arc::new(LogNotifier::new()));
    let handle = dispatcher.spawn(rx);

    let mut ingestion = BinanceIngestion::with_connector(mapping(), connector);
    ingestion.start(tx);
    wait_for_symbols(&cache, 1).await;

    ingestion.stop().await;
    tokio_test::assert_ok!(handle.await);

    let btc = cache.get_one("BTC-USD").await.unwrap();
    assert_eq!(btc.price, 65000.50);
    assert_eq!(btc.change_24h, 1.25);
    assert_eq!(btc.timestamp.timestamp_millis(), 1704067200000);
    assert!(cache.get_one("DOGE-USD").await.is_err());
    assert_eq!(cache.len().await, 1);
    assert_eq!(dispatcher.stats().committed, 1);
}

#[tokio::test]
async fn test_synthetic_feed_fills_cache() {
    let cache = PriceCache::new();
    let (tx, rx) = update_queue(64);
    let dispatcher = Dispatcher::new(cache.clone(), Arc::new(LogNotifier::new()));
    let handle = dispatcher.spawn(rx);

    let mut ingestion = SyntheticIngestion::from_mapping(&mapping())
        .with_seed(7)
        .tick_interval_ms(1..=5);
    ingestion.start(tx);
    wait_for_symbols(&cache, 5).await;

    ingestion.stop().await;
    tokio_test::assert_ok!(handle.await);

    let committed = dispatcher.stats().committed;
    let prices = cache.get_all().await;
    assert_eq!(prices.len(), 5);
    for (symbol, record) in &prices {
        assert_eq!(symbol, &record.symbol);
        assert_eq!(record.source, SYNTHETIC_SOURCE);
        assert!(record.price > 0.0);
    }

    // Nothing arrives once stop has returned
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(dispatcher.stats().committed, committed);
}
