//! Core wire types and codec for gwrpc
//!
//! This crate holds everything about the Graphene `call` protocol that does
//! not need a socket:
//!
//! - **Types**: call envelopes, replies, well-known API namespaces
//! - **Codec**: envelope encoding and reply decoding with protocol-error mapping
//! - **Error handling**: the error taxonomy shared by every gwrpc crate
//! - **Configuration**: node URL, timeouts and cache TTL
//! - **Observability**: tracing subscriber and OpenTelemetry bootstrap
//!
//! The `gwrpc-client` crate builds the WebSocket client on top of it.
//!
//! # Example
//!
//! ```rust
//! use gwrpc_core::{codec, RpcEnvelope, DATABASE_API_ID};
//! use serde_json::json;
//!
//! let envelope = RpcEnvelope::call(1, DATABASE_API_ID, "get_global_properties", json!([]));
//! let text = codec::encode_envelope(&envelope).unwrap();
//! assert_eq!(text, r#"{"id":1,"method":"call","params":[0,"get_global_properties",[]]}"#);
//!
//! let reply = codec::decode_reply(br#"{"id":1,"result":{"id":"2.0.0"}}"#).unwrap();
//! assert_eq!(reply.into_result().unwrap()["id"], "2.0.0");
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod observability;
pub mod types;

pub use config::ClientConfig;
pub use error::{Error, Result, RpcErrorObject};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use types::{
    ApiId, CallParams, ReplyOutcome, RequestId, RpcEnvelope, RpcReply, CALL_METHOD, DATABASE_API,
    DATABASE_API_ID, LOGIN_API, LOGIN_API_ID,
};
