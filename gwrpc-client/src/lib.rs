//! WebSocket RPC client for Graphene blockchain nodes
//!
//! This crate talks the Graphene `call` protocol over a single persistent
//! WebSocket. It keeps the connection honest so callers don't have to:
//!
//! # Core Features
//!
//! - **Request-Response**: one request on the wire at a time, ids increasing
//! - **Namespace Resolution**: API names mapped to ids on first use, then cached
//! - **Recovery**: a dropped or stalled socket is replaced and the call replayed once
//! - **Error Surfacing**: node errors arrive as `Error::Rpc` with the node's detail text
//! - **Result Cache**: optional TTL memoization of global properties
//! - **Observability**: OpenTelemetry metrics and `tracing` spans
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use gwrpc_client::RpcClient;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RpcClient::connect("wss://node.example.com/ws").await?;
//!
//!     let account = client.get_object("1.2.121").await?;
//!     println!("Account: {}", account);
//!
//!     // Any namespace the node exposes; "history" is resolved on first use
//!     let ops = client
//!         .request("history", "get_account_history", json!(["1.2.121", "1.11.0", 10, "1.11.0"]))
//!         .await?;
//!     println!("History: {}", ops);
//!
//!     Ok(())
//! }
//! ```
//!
//! # With Caching
//!
//! ```rust,no_run
//! use gwrpc_client::ClientBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> gwrpc_core::Result<()> {
//! let client = ClientBuilder::new("wss://node.example.com/ws")
//!     .cache_ttl(Duration::from_secs(3))
//!     .with_default_cache()
//!     .connect()
//!     .await?;
//!
//! // Only the first call within three seconds reaches the node
//! let props = client.get_global_properties().await?;
//! let again = client.get_global_properties().await?;
//! assert_eq!(props, again);
//! # Ok(())
//! # }
//! ```

mod cache;
mod client;
mod client_builder;
mod connection_state;
mod correlator;
mod metrics;
mod namespace;
mod transport;

#[cfg(test)]
mod testing;

pub use cache::{CacheStats, ResultCache};
pub use client::{RpcClient, GLOBAL_PROPERTIES_KEY};
pub use client_builder::ClientBuilder;
pub use connection_state::ConnectionState;
pub use correlator::RequestCorrelator;
pub use metrics::ClientMetrics;
pub use namespace::{ApiResolver, NamespaceLookup};
pub use transport::{Connector, Transport, WsConnector, WsTransport};
