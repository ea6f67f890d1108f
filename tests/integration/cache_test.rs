//! Concurrent access to the price cache

use pricing_hub::cache::PriceCache;
use pricing_hub::feed::{PriceRecord, SYNTHETIC_SOURCE};

const SYMBOLS: [&str; 3] = ["BTC-USD", "ETH-USD", "SOL-USD"];

/// Writers keep `change_24h == price`, so a torn record breaks the equality
fn consistent(symbol: &str, price: f64) -> PriceRecord {
    let mut record = PriceRecord::new(symbol, price, SYNTHETIC_SOURCE);
    record.change_24h = price;
    record
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_observe_partial_updates() {
    let cache = PriceCache::new();

    let writer = {
        let cache = cache.clone();
        tokio::spawn(async move {
            for i in 0..2_000u32 {
                let symbol = SYMBOLS[i as usize % SYMBOLS.len()];
                cache.update(consistent(symbol, f64::from(i))).await;
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move {
                for _ in 0..500 {
                    for (symbol, record) in cache.get_all().await {
                        assert_eq!(symbol, record.symbol);
                        assert_eq!(record.price, record.change_24h);
                    }
                    if let Ok(record) = cache.get_one("BTC-USD").await {
                        assert_eq!(record.price, record.change_24h);
                    }
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }

    assert_eq!(cache.len().await, SYMBOLS.len());
    // Last writes: 1998 -> BTC, 1999 -> ETH, 1997 -> SOL
    assert_eq!(cache.get_one("BTC-USD").await.unwrap().price, 1998.0);
    assert_eq!(cache.get_one("ETH-USD").await.unwrap().price, 1999.0);
    assert_eq!(cache.get_one("SOL-USD").await.unwrap().price, 1997.0);
}
