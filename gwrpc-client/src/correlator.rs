//! Request id allocation and envelope construction
//!
//! The node echoes the request id in its reply, but the client never has
//! more than one request in flight, so replies are matched by position. Ids
//! only have to be unique and increasing for the lifetime of the client;
//! they start at 1 and every attempt, retries included, takes a new one.

use gwrpc_core::{ApiId, RequestId, RpcEnvelope};

/// Allocates request ids and builds call envelopes
///
/// Lives inside the client's session lock, so it needs no synchronization
/// of its own.
#[derive(Debug)]
pub struct RequestCorrelator {
    next: RequestId,
}

impl RequestCorrelator {
    /// Correlator whose first id is 1
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Take the next id
    pub fn next_id(&mut self) -> RequestId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Id the next call to `next_id` will return
    pub fn peek(&self) -> RequestId {
        self.next
    }

    /// Build the `call` envelope for one attempt
    pub fn build_envelope(
        &self,
        api_id: ApiId,
        method: &str,
        params: serde_json::Value,
        id: RequestId,
    ) -> RpcEnvelope {
        RpcEnvelope::call(id, api_id, method, params)
    }
}

impl Default for RequestCorrelator {
    fn default() -> Self {
        Self::new()
    }
}
