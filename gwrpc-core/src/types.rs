//! Wire types for the Graphene `call` protocol
//!
//! Graphene nodes (BitShares and its forks) speak a JSON-RPC dialect in which
//! every request uses the single method `"call"` and addresses the real method
//! through a numeric API namespace:
//!
//! ```text
//! {"id": 7, "method": "call", "params": [0, "get_objects", [["1.2.3"]]]}
//!                                         ^  ^              ^
//!                                    api id  method name    argument list
//! ```
//!
//! Replies carry the same `id` and exactly one of `result` or `error`.
//!
//! # Request IDs
//!
//! Ids are plain unsigned counters. Correlation is positional (one send, one
//! receive), so the id is only used to sanity-check replies and to make wire
//! traces readable.

use crate::error::RpcErrorObject;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Correlation id of a single request
pub type RequestId = u64;

/// Numeric id of an API namespace on the node
pub type ApiId = u64;

/// Namespace that hosts object and chain-property lookups
pub const DATABASE_API: &str = "database";

/// Wire id of the database namespace, fixed by the node
pub const DATABASE_API_ID: ApiId = 0;

/// Namespace used to look up the ids of every other namespace
pub const LOGIN_API: &str = "login";

/// Wire id of the login namespace, fixed by the node
pub const LOGIN_API_ID: ApiId = 1;

/// The only JSON-RPC method name Graphene nodes accept for calls
pub const CALL_METHOD: &str = "call";

/// `[api id, method name, argument list]`
///
/// A tuple struct so that serde writes it as a three-element JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallParams(pub ApiId, pub String, pub serde_json::Value);

impl CallParams {
    /// Namespace the call is addressed to
    pub fn api_id(&self) -> ApiId {
        self.0
    }

    /// Method invoked inside the namespace
    pub fn method(&self) -> &str {
        &self.1
    }

    /// Positional arguments
    pub fn args(&self) -> &serde_json::Value {
        &self.2
    }
}

/// Outbound request envelope
///
/// # Examples
///
/// ```rust
/// use gwrpc_core::RpcEnvelope;
/// use serde_json::json;
///
/// let envelope = RpcEnvelope::call(3, 0, "get_objects", json!([["1.2.3"]]));
/// assert_eq!(
///     serde_json::to_value(&envelope).unwrap(),
///     json!({"id": 3, "method": "call", "params": [0, "get_objects", [["1.2.3"]]]})
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcEnvelope {
    /// Correlation id
    pub id: RequestId,
    /// Always `"call"`
    pub method: String,
    /// Namespace, method and arguments
    pub params: CallParams,
}

impl RpcEnvelope {
    /// Build a `call` envelope
    pub fn call(
        id: RequestId,
        api_id: ApiId,
        method: impl Into<String>,
        args: serde_json::Value,
    ) -> Self {
        Self {
            id,
            method: CALL_METHOD.to_string(),
            params: CallParams(api_id, method.into(), args),
        }
    }
}

impl fmt::Display for RpcEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {}.{}",
            self.id,
            self.params.api_id(),
            self.params.method()
        )
    }
}

/// What a reply carries besides its id
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyOutcome {
    /// The call succeeded; the value may legitimately be `null`
    Result(serde_json::Value),
    /// The node rejected the call
    Error(RpcErrorObject),
}

/// Decoded inbound reply
#[derive(Debug, Clone, PartialEq)]
pub struct RpcReply {
    /// Echoed correlation id; `None` if the node omitted it or sent a
    /// non-numeric one
    pub id: Option<RequestId>,
    /// Result or error
    pub outcome: ReplyOutcome,
}

impl RpcReply {
    /// Successful reply
    pub fn success(id: RequestId, result: serde_json::Value) -> Self {
        Self {
            id: Some(id),
            outcome: ReplyOutcome::Result(result),
        }
    }

    /// Error reply
    pub fn failure(id: RequestId, error: RpcErrorObject) -> Self {
        Self {
            id: Some(id),
            outcome: ReplyOutcome::Error(error),
        }
    }

    /// Returns true if the node reported an error
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, ReplyOutcome::Error(_))
    }

    /// Convert into the call result, mapping a node error to `Error::Rpc`
    pub fn into_result(self) -> crate::Result<serde_json::Value> {
        match self.outcome {
            ReplyOutcome::Result(value) => Ok(value),
            ReplyOutcome::Error(error) => Err(error.into()),
        }
    }
}
