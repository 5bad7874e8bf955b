//! Client configuration
//!
//! The client only needs the node's WebSocket URL; the remaining knobs bound
//! how long a connect or a read may block and how long memoized reads stay
//! fresh.
//!
//! # Environment Variables
//!
//! `ClientConfig::from_env()` reads:
//! - `GWRPC_WEBSOCKET_URL`: node endpoint (required)
//! - `GWRPC_CONNECT_TIMEOUT_MS`: connect deadline in milliseconds
//! - `GWRPC_READ_TIMEOUT_MS`: per-reply deadline in milliseconds
//! - `GWRPC_CACHE_TTL_SECS`: lifetime of memoized results in seconds
//!
//! # Examples
//!
//! ```rust
//! use gwrpc_core::ClientConfig;
//! use std::time::Duration;
//!
//! let config = ClientConfig::new("wss://node.example.org/ws")
//!     .with_read_timeout(Duration::from_secs(5));
//! assert_eq!(config.connect_timeout, Duration::from_secs(10));
//! ```

use crate::error::{Error, Result};
use std::time::Duration;

/// Environment variable holding the node URL
pub const ENV_WEBSOCKET_URL: &str = "GWRPC_WEBSOCKET_URL";
/// Environment variable holding the connect timeout in milliseconds
pub const ENV_CONNECT_TIMEOUT_MS: &str = "GWRPC_CONNECT_TIMEOUT_MS";
/// Environment variable holding the read timeout in milliseconds
pub const ENV_READ_TIMEOUT_MS: &str = "GWRPC_READ_TIMEOUT_MS";
/// Environment variable holding the cache TTL in seconds
pub const ENV_CACHE_TTL_SECS: &str = "GWRPC_CACHE_TTL_SECS";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Connection and caching settings for one client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket endpoint of the node (`ws://` or `wss://`)
    pub url: String,

    /// Upper bound on establishing the socket and completing the handshake
    pub connect_timeout: Duration,

    /// Upper bound on waiting for a reply once a request has been sent
    ///
    /// An elapsed read is a transport fault: the connection is dropped and
    /// the call is replayed once.
    pub read_timeout: Duration,

    /// How long memoized results (global properties) are served from cache
    pub cache_ttl: Duration,
}

impl ClientConfig {
    /// Configuration with default timeouts for the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Load configuration from `GWRPC_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// `from_env()` is this with `std::env::var`; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(ENV_WEBSOCKET_URL)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("{} is not set", ENV_WEBSOCKET_URL)))?;

        let mut config = Self::new(url.trim());
        if let Some(ms) = parse_number(&lookup, ENV_CONNECT_TIMEOUT_MS)? {
            config.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_number(&lookup, ENV_READ_TIMEOUT_MS)? {
            config.read_timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_number(&lookup, ENV_CACHE_TTL_SECS)? {
            config.cache_ttl = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Set the connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the read timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the TTL for memoized results
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Check the settings before dialing
    pub fn validate(&self) -> Result<()> {
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(Error::Config(format!(
                "expected a ws:// or wss:// URL, got {:?}",
                self.url
            )));
        }
        if self.connect_timeout.is_zero() || self.read_timeout.is_zero() {
            return Err(Error::Config("timeouts must be non-zero".to_string()));
        }
        Ok(())
    }
}

fn parse_number<F>(lookup: &F, key: &str) -> Result<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| Error::Config(format!("{}={:?}: {}", key, raw, e))),
    }
}
