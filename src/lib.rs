//! gwrpc - Graphene JSON-RPC over WebSocket
//!
//! This is the main convenience crate that re-exports the gwrpc sub-crates.
//! Use it if you want a single dependency for talking to a Graphene node.
//!
//! # Architecture
//!
//! gwrpc is organized into two crates:
//!
//! - **gwrpc-core**: Wire types, codec, error handling, configuration, observability
//! - **gwrpc-client**: WebSocket client with namespace resolution and one-shot retry
//!
//! # Quick Start
//!
//! The client is an ordinary value: build it once where the application is
//! wired together and hand clones to whatever needs it.
//!
//! ```rust,no_run
//! use gwrpc::{ClientBuilder, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::from_env()?;
//!     let client = ClientBuilder::from_config(config)
//!         .with_default_cache()
//!         .connect()
//!         .await?;
//!
//!     let props = client.get_global_properties().await?;
//!     println!("Global properties: {}", props);
//!
//!     let asset = client.get_object("1.3.0").await?;
//!     println!("Core asset: {}", asset);
//!
//!     Ok(())
//! }
//! ```

// Re-export all public APIs from sub-crates
pub use gwrpc_client as client;
pub use gwrpc_core as core;

// Convenience re-exports of the most commonly used types
pub use gwrpc_client::{ClientBuilder, ConnectionState, ResultCache, RpcClient};
pub use gwrpc_core::{ClientConfig, Error, Result};
