//! Client builder for timeouts, caching and observability
//!
//! The `ClientBuilder` provides a fluent API for configuring the client
//! before the first connection is made. It allows you to:
//! - Tune connect and read timeouts
//! - Attach a result cache for global properties
//! - Configure observability (OpenTelemetry) and client metrics
//! - Swap the WebSocket connector for another `Connector`
//!
//! # Examples
//!
//! ```rust,no_run
//! use gwrpc_client::ClientBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> gwrpc_core::Result<()> {
//! let client = ClientBuilder::new("wss://node.example.com/ws")
//!     .read_timeout(Duration::from_secs(10))
//!     .with_default_cache()
//!     .connect()
//!     .await?;
//!
//! // From GWRPC_* environment variables, with telemetry
//! let config = gwrpc_core::ClientConfig::from_env()?;
//! let client2 = ClientBuilder::from_config(config)
//!     .with_default_observability()
//!     .service_name("wallet-backend")
//!     .connect()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::transport::{Connector, WsConnector};
use crate::{ClientMetrics, ResultCache, RpcClient};
use gwrpc_core::{ClientConfig, Error, ObservabilityConfig, Result};
use std::sync::Arc;
use std::time::Duration;

/// Builder for configuring and creating an RpcClient
pub struct ClientBuilder {
    config: ClientConfig,
    connector: Option<Arc<dyn Connector>>,
    cache: Option<Arc<ResultCache>>,
    observability_config: Option<ObservabilityConfig>,
    service_name: Option<String>,
    enable_metrics: bool,
}

impl ClientBuilder {
    /// Create a new client builder with default settings for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self::from_config(ClientConfig::new(url))
    }

    /// Create a new client builder from a complete configuration
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            connector: None,
            cache: None,
            observability_config: None,
            service_name: None,
            enable_metrics: false,
        }
    }

    /// Upper bound on establishing a connection
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Upper bound on waiting for a reply
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// How long cached results stay fresh
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    /// Share an existing result cache
    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Attach a fresh result cache
    pub fn with_default_cache(self) -> Self {
        self.with_cache(Arc::new(ResultCache::new()))
    }

    /// Dial through `connector` instead of plain WebSockets
    pub fn with_connector(mut self, connector: impl Connector + 'static) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Enable OpenTelemetry observability with custom configuration
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    /// Enable OpenTelemetry observability with default configuration
    pub fn with_default_observability(mut self) -> Self {
        self.observability_config = Some(ObservabilityConfig::default());
        self
    }

    /// Set service name for observability (used if observability is enabled)
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Record client metrics against the global meter provider
    ///
    /// Implied by `with_observability`; use this when the host application
    /// installs its own provider.
    pub fn with_metrics(mut self) -> Self {
        self.enable_metrics = true;
        self
    }

    /// Build the client and open its first connection
    ///
    /// Fails with `Error::Config` for an invalid configuration and with
    /// `Error::Connection` when the node cannot be reached.
    pub async fn connect(self) -> Result<RpcClient> {
        self.config.validate()?;

        let metrics = if let Some(mut config) = self.observability_config {
            if let Some(ref name) = self.service_name {
                config.service_name = name.clone();
            }

            gwrpc_core::init_observability(config.clone())
                .map_err(|e| Error::Config(format!("Failed to initialize observability: {}", e)))?;

            Some(Arc::new(ClientMetrics::new(config.service_name)))
        } else if self.enable_metrics {
            let name = self.service_name.unwrap_or_else(|| "gwrpc".to_string());
            Some(Arc::new(ClientMetrics::new(name)))
        } else {
            None
        };

        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(WsConnector) as Arc<dyn Connector>);

        let client = RpcClient::from_parts(self.config, connector, self.cache, metrics);
        client.establish().await?;
        Ok(client)
    }
}
