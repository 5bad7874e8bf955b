//! Observability client example
//!
//! Polls a node with OpenTelemetry traces and metrics enabled.
//!
//! Run with: cargo run --example observability_client -- wss://node.example.com/ws

use gwrpc::core::ObservabilityConfig;
use gwrpc::ClientBuilder;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://127.0.0.1:8090".to_string());

    let otel_config = ObservabilityConfig::new("gwrpc-observability-client")
        .with_endpoint("http://localhost:4317")
        .with_log_level("debug");

    let client = ClientBuilder::new(url)
        .with_observability(otel_config)
        .service_name("observability-client")
        .cache_ttl(Duration::from_secs(2))
        .with_default_cache()
        .connect()
        .await?;

    for i in 1..=10 {
        tracing::info!(iteration = i, "Polling node");

        let props = client.get_global_properties().await?;
        let account = client.get_object("1.2.0").await?;
        println!(
            "Iteration {}: block interval {}, committee account {}",
            i, props["parameters"]["block_interval"], account["name"]
        );

        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    if let Some(cache) = client.cache() {
        let stats = cache.stats();
        println!("Cache: {} hits, {} misses", stats.hits, stats.misses);
    }
    println!("View traces at http://localhost:16686 (Jaeger UI)");

    // Give time for telemetry to flush
    tokio::time::sleep(Duration::from_secs(2)).await;
    gwrpc::core::shutdown_observability();

    Ok(())
}
