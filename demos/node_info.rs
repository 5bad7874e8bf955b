//! Node info example
//!
//! Prints the chain's global properties and a few well-known objects.
//!
//! Run with: GWRPC_WEBSOCKET_URL=wss://node.example.com/ws cargo run --example node_info

use gwrpc::{ClientBuilder, ClientConfig, Error};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Asset {
    id: String,
    symbol: String,
    precision: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ClientConfig::from_env()?;
    println!("Connecting to {}", config.url);

    let client = ClientBuilder::from_config(config)
        .with_default_cache()
        .connect()
        .await?;

    let props = client.get_global_properties().await?;
    println!("Chain parameters: {}", props["parameters"]);

    // Second call is served from the cache
    let _ = client.get_global_properties().await?;

    let core: Vec<Option<Asset>> = client
        .request_as("database", "get_objects", (vec!["1.3.0"],))
        .await?;
    if let Some(Some(asset)) = core.first() {
        println!("Core asset {}: {} ({} decimals)", asset.id, asset.symbol, asset.precision);
    }

    for id in ["1.2.0", "1.2.999999999"] {
        match client.get_object(id).await {
            Ok(object) => println!("{} = {}", id, object),
            Err(Error::NotFound(_)) => println!("{} does not exist", id),
            Err(e) => return Err(e.into()),
        }
    }

    match client.api_id("history").await {
        Ok(id) => println!("history API id: {}", id),
        Err(e) => tracing::warn!(error = %e, "history API unavailable"),
    }
    println!("Known APIs: {:?}", client.known_apis().await);

    client.close().await;
    Ok(())
}
