//! Graphene RPC client over a persistent WebSocket
//!
//! This module provides the main `RpcClient` type. It owns one socket to a
//! node and turns `(api, method, params)` calls into `call` envelopes,
//! resolving API namespaces on first use.
//!
//! # Request Lifecycle
//!
//! 1. **Connect**: dial lazily if the socket is down
//! 2. **Resolve**: map the API name to its numeric id (may cost one login call)
//! 3. **Exchange**: send the envelope and read exactly one reply
//! 4. **Recover**: on a transport fault, reconnect and replay the call once
//!
//! Only `ConnectionClosed`, `Transport` and `Timeout` trigger recovery. RPC
//! errors, protocol errors and serialization errors reach the caller as-is,
//! and whatever the replay fails with is final.
//!
//! # Cancellation
//!
//! Replies are paired with requests by position, so a socket may only be
//! reused once the previous reply has been read. A request future dropped
//! between send and receive (a caller-side timeout, a losing `select!`
//! branch) leaves its exchange marked in flight, and the next request drops
//! that socket and dials a fresh one. A reply carrying another request's id
//! is treated as a transport fault for the same reason.
//!
//! # Cloning
//!
//! `RpcClient` is a cheap handle around shared state. Clones share the socket,
//! the namespace table and the id sequence, and their requests are serialized:
//! one request is on the wire at a time.

use crate::cache::ResultCache;
use crate::connection_state::{ConnectionSlot, ConnectionState};
use crate::correlator::RequestCorrelator;
use crate::namespace::{ApiResolver, NamespaceLookup};
use crate::transport::Connector;
use crate::{ClientBuilder, ClientMetrics};
use async_trait::async_trait;
use gwrpc_core::{codec, ApiId, ClientConfig, Error, Result, DATABASE_API, LOGIN_API_ID};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Cache key for `get_global_properties`, which takes no arguments
pub const GLOBAL_PROPERTIES_KEY: &str = "database.get_global_properties";

/// One socket and the id sequence used on it
struct Exchange {
    connection: ConnectionSlot,
    correlator: RequestCorrelator,
    read_timeout: Duration,
    /// Set from send until the reply is read; still set means a call was cancelled
    in_flight: bool,
    metrics: Option<Arc<ClientMetrics>>,
}

impl Exchange {
    /// Send one call and read its reply
    ///
    /// A failed exchange closes the connection before it is returned, so a
    /// late reply can never be read as the answer to a later request.
    async fn call(&mut self, api_id: ApiId, method: &str, args: Value) -> Result<Value> {
        let id = self.correlator.next_id();
        let envelope = self.correlator.build_envelope(api_id, method, args, id);
        let payload = codec::encode_envelope(&envelope)?;
        tracing::trace!(request = %envelope, "Sending request");

        let data = match self.round_trip(payload).await {
            Ok(data) => data,
            Err(error) => {
                self.connection.close().await;
                self.in_flight = false;
                return Err(error);
            }
        };
        self.in_flight = false;

        let reply = codec::decode_reply(&data)?;
        if reply.id != Some(id) {
            tracing::warn!(expected = id, received = ?reply.id, "Reply id does not match request, dropping connection");
            self.connection.close().await;
            return Err(Error::Transport(format!(
                "reply id {:?} does not match request id {}",
                reply.id, id
            )));
        }
        reply.into_result().map_err(|error| {
            tracing::debug!(request = %envelope, error = %error, "Node returned an error");
            error
        })
    }

    async fn round_trip(&mut self, payload: String) -> Result<Vec<u8>> {
        let read_timeout = self.read_timeout;
        let transport = self
            .connection
            .transport_mut()
            .ok_or(Error::ConnectionClosed)?;

        self.in_flight = true;
        transport.send(payload).await?;
        match tokio::time::timeout(read_timeout, transport.receive()).await {
            Ok(received) => received,
            Err(_) => Err(Error::Timeout(read_timeout)),
        }
    }
}

#[async_trait]
impl NamespaceLookup for Exchange {
    async fn lookup_api(&mut self, name: &str) -> Result<Value> {
        let result = self.call(LOGIN_API_ID, name, json!([])).await?;
        if let Some(ref m) = self.metrics {
            m.record_namespace_resolution(name);
        }
        Ok(result)
    }
}

impl Exchange {
    /// Close a socket left mid-exchange by a cancelled call
    async fn recover_interrupted(&mut self) {
        if self.in_flight {
            tracing::warn!("Previous request was cancelled before its reply arrived, dropping connection");
            self.connection.close().await;
            self.in_flight = false;
        }
    }
}

/// Everything guarded by the client's lock
pub(crate) struct Session {
    resolver: ApiResolver,
    exchange: Exchange,
}

impl Session {
    pub(crate) fn new(read_timeout: Duration, metrics: Option<Arc<ClientMetrics>>) -> Self {
        Self {
            resolver: ApiResolver::new(),
            exchange: Exchange {
                connection: ConnectionSlot::new(),
                correlator: RequestCorrelator::new(),
                read_timeout,
                in_flight: false,
                metrics,
            },
        }
    }

    async fn resolve(&mut self, api: &str) -> Result<ApiId> {
        self.resolver.resolve(api, &mut self.exchange).await
    }

    /// One attempt: resolve the namespace, then exchange the call
    async fn attempt(&mut self, api: &str, method: &str, params: &Value) -> Result<Value> {
        let api_id = self.resolve(api).await?;
        self.exchange.call(api_id, method, params.clone()).await
    }

    fn state(&self) -> ConnectionState {
        self.exchange.connection.state()
    }
}

/// RPC client for a Graphene node
#[derive(Clone)]
pub struct RpcClient {
    config: Arc<ClientConfig>,
    connector: Arc<dyn Connector>,
    session: Arc<Mutex<Session>>,
    cache: Option<Arc<ResultCache>>,
    metrics: Option<Arc<ClientMetrics>>,
}

impl RpcClient {
    /// Connect to a node with default settings
    ///
    /// Use `ClientBuilder` for timeouts, caching or observability.
    pub async fn connect(url: &str) -> Result<Self> {
        ClientBuilder::new(url).connect().await
    }

    pub(crate) fn from_parts(
        config: ClientConfig,
        connector: Arc<dyn Connector>,
        cache: Option<Arc<ResultCache>>,
        metrics: Option<Arc<ClientMetrics>>,
    ) -> Self {
        let session = Session::new(config.read_timeout, metrics.clone());
        Self {
            config: Arc::new(config),
            connector,
            session: Arc::new(Mutex::new(session)),
            cache,
            metrics,
        }
    }

    /// Open the socket now instead of on the first request
    pub(crate) async fn establish(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        self.open(&mut session).await
    }

    /// Settings this client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Metrics recorder, if one is attached
    pub fn metrics(&self) -> Option<&Arc<ClientMetrics>> {
        self.metrics.as_ref()
    }

    /// Result cache, if one is attached
    pub fn cache(&self) -> Option<&Arc<ResultCache>> {
        self.cache.as_ref()
    }

    /// Current connection state
    ///
    /// Waits for any in-flight request to finish first.
    pub async fn connection_state(&self) -> ConnectionState {
        self.session.lock().await.state()
    }

    /// Close the socket
    ///
    /// The client stays usable: the next request dials a new connection.
    pub async fn close(&self) {
        let mut session = self.session.lock().await;
        session.exchange.connection.close().await;
        session.exchange.in_flight = false;
        self.record_state(&session);
        tracing::info!("Connection closed by client");
    }

    /// Call `method` on the `api` namespace and return the raw result
    #[tracing::instrument(skip(self, api, method, params), fields(api = %api, method = %method))]
    pub async fn request(&self, api: &str, method: &str, params: Value) -> Result<Value> {
        let start = Instant::now();
        let result = {
            let mut session = self.session.lock().await;
            let result = self.request_locked(&mut session, api, method, &params).await;
            self.record_state(&session);
            result
        };

        if let Some(ref m) = self.metrics {
            let duration = start.elapsed().as_secs_f64();
            match &result {
                Ok(_) => m.record_request(api, method, "success", duration),
                Err(error) => {
                    m.record_request(api, method, "error", duration);
                    m.record_error(error.kind());
                }
            }
        }
        result
    }

    /// Typed variant of `request`
    ///
    /// Encoding and decoding failures are `Error::Serialization` and are
    /// never retried.
    pub async fn request_as<P, R>(&self, api: &str, method: &str, params: P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let params =
            serde_json::to_value(params).map_err(|e| Error::Serialization(e.to_string()))?;
        let result = self.request(api, method, params).await?;
        serde_json::from_value(result).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Fetch one object by id
    ///
    /// Fails with `Error::NotFound` when the node has no such object.
    pub async fn get_object(&self, id: &str) -> Result<Value> {
        let result = self
            .request(DATABASE_API, "get_objects", json!([[id]]))
            .await?;
        first_object(id, result)
    }

    /// Fetch several objects at once
    ///
    /// The list is returned as the node sent it: same order as `ids`, with
    /// `null` for unknown ids.
    pub async fn get_objects<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<Value>> {
        let ids: Vec<&str> = ids.iter().map(AsRef::as_ref).collect();
        match self.request(DATABASE_API, "get_objects", json!([ids])).await? {
            Value::Array(objects) => Ok(objects),
            other => Err(Error::Protocol(format!(
                "expected a list of objects, got {}",
                other
            ))),
        }
    }

    /// Fetch the chain's global properties
    ///
    /// Served from the attached cache while the entry is younger than
    /// `cache_ttl`.
    pub async fn get_global_properties(&self) -> Result<Value> {
        let Some(ref cache) = self.cache else {
            return self.fetch_global_properties().await;
        };

        let mut fetched = false;
        let result = cache
            .memoize(GLOBAL_PROPERTIES_KEY, self.config.cache_ttl, || {
                fetched = true;
                self.fetch_global_properties()
            })
            .await;
        if let Some(ref m) = self.metrics {
            m.record_cache_lookup(GLOBAL_PROPERTIES_KEY, !fetched);
        }
        result
    }

    async fn fetch_global_properties(&self) -> Result<Value> {
        self.request(DATABASE_API, "get_global_properties", json!([]))
            .await
    }

    /// Numeric id of an API namespace, resolving it if needed
    ///
    /// Makes a single attempt; a transport fault is returned, not retried.
    pub async fn api_id(&self, name: &str) -> Result<ApiId> {
        let mut session = self.session.lock().await;
        if let Some(id) = session.resolver.get(name) {
            return Ok(id);
        }
        self.ensure_connected(&mut session).await?;
        let result = session.resolve(name).await;
        self.record_state(&session);
        result
    }

    /// Every namespace resolved so far, seeded ones included
    pub async fn known_apis(&self) -> BTreeMap<String, ApiId> {
        self.session.lock().await.resolver.known()
    }

    async fn request_locked(
        &self,
        session: &mut Session,
        api: &str,
        method: &str,
        params: &Value,
    ) -> Result<Value> {
        self.ensure_connected(session).await?;

        match session.attempt(api, method, params).await {
            Err(error) if error.is_transport_fault() => {
                tracing::warn!(error = %error, "Transport fault, reconnecting and retrying once");
                if let Some(ref m) = self.metrics {
                    m.record_reconnection_attempt();
                }
                self.open(session).await?;
                if let Some(ref m) = self.metrics {
                    m.record_reconnection_success();
                }
                session.attempt(api, method, params).await
            }
            outcome => outcome,
        }
    }

    /// Make sure the session has a socket that is safe to send on
    async fn ensure_connected(&self, session: &mut Session) -> Result<()> {
        session.exchange.recover_interrupted().await;
        if session.state() == ConnectionState::Disconnected {
            tracing::debug!("No live connection, connecting before request");
            self.open(session).await?;
        }
        Ok(())
    }

    fn record_state(&self, session: &Session) {
        if let Some(ref m) = self.metrics {
            m.update_connection_state(session.state());
        }
    }

    async fn open(&self, session: &mut Session) -> Result<()> {
        let result = session
            .exchange
            .connection
            .open(
                self.connector.as_ref(),
                &self.config.url,
                self.config.connect_timeout,
            )
            .await;
        self.record_state(session);
        result
    }
}

/// First element of a `get_objects` result
fn first_object(id: &str, result: Value) -> Result<Value> {
    match result {
        Value::Array(objects) => match objects.into_iter().next() {
            Some(Value::Null) | None => Err(Error::NotFound(id.to_string())),
            Some(object) => Ok(object),
        },
        other => Err(Error::Protocol(format!(
            "expected a list of objects, got {}",
            other
        ))),
    }
}
