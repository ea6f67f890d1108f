//! Full service wiring on the synthetic feed

use pricing_hub::cli::run_service;
use pricing_hub::config::{Config, FeedMode};
use std::time::Duration;
use tokio::net::TcpListener;

#[tokio::test]
async fn test_service_runs_and_shuts_down() {
    let mut config = Config::default();
    config.feed.mode = FeedMode::Synthetic;
    config.server.shutdown_timeout_secs = 2;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Every generator ticks within 2s
    let stats = tokio::time::timeout(
        Duration::from_secs(10),
        run_service(config, listener, tokio::time::sleep(Duration::from_millis(2500))),
    )
    .await
    .expect("service did not shut down")
    .unwrap();

    assert!(stats.committed >= 5, "committed {}", stats.committed);
    assert_eq!(stats.notify_failures, 0);

    // Listener is released once the service returns
    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}
