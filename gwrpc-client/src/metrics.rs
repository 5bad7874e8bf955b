//! Client metrics definitions
//!
//! OpenTelemetry instruments for the client's health and performance,
//! exported through whatever meter provider `init_observability` installed.
//!
//! # Metrics Collected
//!
//! - **connection_state**: Current connection status (gauge)
//! - **requests_total**: Requests completed, by API, method and status (counter)
//! - **request_duration**: Request latency including any retry (histogram)
//! - **errors_total**: Failed requests by error kind (counter)
//! - **reconnection_attempts**: Reconnects triggered by transport faults (counter)
//! - **reconnection_success**: Reconnects that produced a live socket (counter)
//! - **namespace_resolutions**: Namespace ids learned from the node (counter)
//! - **cache_lookups**: Memoized lookups by outcome (counter)
//!
//! # Examples
//!
//! ```rust,no_run
//! use gwrpc_client::ClientMetrics;
//!
//! let metrics = ClientMetrics::new("my-wallet");
//! metrics.record_request("database", "get_objects", "success", 0.012);
//! ```

use crate::ConnectionState;
use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Histogram, Meter},
    KeyValue,
};
use std::sync::atomic::{AtomicI64, Ordering};

/// Client metrics for monitoring
pub struct ClientMetrics {
    /// Connection state (0=disconnected, 1=connected)
    pub connection_state: Gauge<i64>,
    /// Total number of requests completed
    pub requests_total: Counter<u64>,
    /// Request duration in seconds
    pub request_duration: Histogram<f64>,
    /// Total number of failed requests
    pub errors_total: Counter<u64>,
    /// Total number of reconnection attempts
    pub reconnection_attempts: Counter<u64>,
    /// Total number of successful reconnections
    pub reconnection_success: Counter<u64>,
    /// Total number of namespaces resolved through the login API
    pub namespace_resolutions: Counter<u64>,
    /// Memoized lookups, labelled hit or miss
    pub cache_lookups: Counter<u64>,
    last_connection_state: AtomicI64,
}

impl ClientMetrics {
    /// Create a new ClientMetrics instance
    pub fn new(service_name: impl Into<String>) -> Self {
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Create a new ClientMetrics instance with a custom meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            connection_state: meter
                .i64_gauge("gwrpc.client.connection.state")
                .with_description("Connection state (0=disconnected, 1=connected)")
                .build(),
            requests_total: meter
                .u64_counter("gwrpc.client.requests.total")
                .with_description("Total number of requests completed")
                .build(),
            request_duration: meter
                .f64_histogram("gwrpc.client.request.duration")
                .with_description("Request duration in seconds")
                .build(),
            errors_total: meter
                .u64_counter("gwrpc.client.errors.total")
                .with_description("Total number of failed requests")
                .build(),
            reconnection_attempts: meter
                .u64_counter("gwrpc.client.reconnection.attempts")
                .with_description("Total number of reconnection attempts")
                .build(),
            reconnection_success: meter
                .u64_counter("gwrpc.client.reconnection.success")
                .with_description("Total number of successful reconnections")
                .build(),
            namespace_resolutions: meter
                .u64_counter("gwrpc.client.namespace.resolutions")
                .with_description("Total number of API namespaces resolved")
                .build(),
            cache_lookups: meter
                .u64_counter("gwrpc.client.cache.lookups")
                .with_description("Memoized lookups by outcome")
                .build(),
            last_connection_state: AtomicI64::new(ConnectionState::Disconnected.as_gauge()),
        }
    }

    /// Update connection state
    pub fn update_connection_state(&self, state: ConnectionState) {
        let code = state.as_gauge();
        self.last_connection_state.store(code, Ordering::Relaxed);
        self.connection_state.record(code, &[]);
    }

    /// Last value recorded on the connection-state gauge
    pub fn last_connection_state(&self) -> i64 {
        self.last_connection_state.load(Ordering::Relaxed)
    }

    /// Record a completed request
    pub fn record_request(&self, api: &str, method: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("api", api.to_string()),
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.requests_total.add(1, attributes);
        self.request_duration.record(duration_secs, attributes);
    }

    /// Record an error
    pub fn record_error(&self, error_type: &str) {
        let attributes = &[KeyValue::new("error_type", error_type.to_string())];
        self.errors_total.add(1, attributes);
    }

    /// Record a reconnection attempt
    pub fn record_reconnection_attempt(&self) {
        self.reconnection_attempts.add(1, &[]);
    }

    /// Record a successful reconnection
    pub fn record_reconnection_success(&self) {
        self.reconnection_success.add(1, &[]);
    }

    /// Record a namespace id learned from the node
    pub fn record_namespace_resolution(&self, api: &str) {
        let attributes = &[KeyValue::new("api", api.to_string())];
        self.namespace_resolutions.add(1, attributes);
    }

    /// Record a memoized lookup
    pub fn record_cache_lookup(&self, key: &str, hit: bool) {
        let attributes = &[
            KeyValue::new("key", key.to_string()),
            KeyValue::new("outcome", if hit { "hit" } else { "miss" }),
        ];
        self.cache_lookups.add(1, attributes);
    }
}
