//! Error types for gwrpc
//!
//! Two kinds of error live here:
//!
//! - **Error**: everything a caller of the client can observe (uses thiserror)
//! - **RpcErrorObject**: the `error` member of a node reply, exactly as it
//!   appears on the wire
//!
//! # Recovery Classes
//!
//! The variants fall into three groups, and the client treats them differently:
//!
//! - **Transport faults** (`ConnectionClosed`, `Transport`, `Timeout`): the socket
//!   is unusable. The client drops it, reconnects once and replays the call.
//! - **Connect failures** (`Connection`): the node could not be reached at all.
//!   Surfaced to whoever triggered the connect.
//! - **Everything else** (`Protocol`, `Rpc`, `NotFound`, `Serialization`,
//!   `Config`): the connection is fine but the exchange is not. Never retried.
//!
//! # Examples
//!
//! ```rust
//! use gwrpc_core::{Error, RpcErrorObject};
//!
//! let wire: RpcErrorObject =
//!     serde_json::from_str(r#"{"message":"Assert Exception","detail":"object 1.2.99 missing"}"#).unwrap();
//! let error = Error::from(wire);
//!
//! assert_eq!(error.to_string(), "RPC error: object 1.2.99 missing");
//! assert!(!error.is_transport_fault());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for gwrpc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for gwrpc operations
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The WebSocket could not be established
    ///
    /// Raised by the initial connect and by the reconnect that precedes a
    /// retry. Fatal for that attempt; the client does not loop on it.
    #[error("Failed to connect to {url}: {reason}")]
    Connection {
        /// Endpoint that was dialed
        url: String,
        /// Underlying failure text
        reason: String,
    },

    /// The peer closed an established connection
    #[error("Connection closed")]
    ConnectionClosed,

    /// Any other I/O fault while sending or receiving a frame
    #[error("Transport error: {0}")]
    Transport(String),

    /// A connect or read deadline elapsed
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The reply could not be understood
    ///
    /// Raised for payloads that are not JSON, or JSON that is not a reply
    /// object. The connection itself is presumed healthy.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The node answered with an `error` member
    ///
    /// `message` is the text the node chose to surface: its `detail` when
    /// present, otherwise its `message`.
    #[error("RPC error: {message}")]
    Rpc {
        /// Text surfaced to the caller
        message: String,
        /// Numeric code, when the node sent one
        code: Option<i64>,
    },

    /// A lookup returned no object for the given id
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Params could not be encoded or a result could not be decoded into
    /// the requested type
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error means the socket is unusable and the call may be
    /// replayed on a fresh connection.
    pub fn is_transport_fault(&self) -> bool {
        matches!(
            self,
            Error::ConnectionClosed | Error::Transport(_) | Error::Timeout(_)
        )
    }

    /// Short stable label used for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Connection { .. } => "connection",
            Error::ConnectionClosed => "connection_closed",
            Error::Transport(_) => "transport",
            Error::Timeout(_) => "timeout",
            Error::Protocol(_) => "protocol",
            Error::Rpc { .. } => "rpc",
            Error::NotFound(_) => "not_found",
            Error::Serialization(_) => "serialization",
            Error::Config(_) => "config",
        }
    }
}

impl From<RpcErrorObject> for Error {
    fn from(error: RpcErrorObject) -> Self {
        Error::Rpc {
            code: error.code,
            message: error.effective_message().to_string(),
        }
    }
}

/// The `error` member of a node reply
///
/// Graphene nodes send `code` and `message`, and usually a `data` blob with
/// a stack. Some proxies flatten the interesting part into `detail`; when it
/// is present it is the better text to show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    /// Numeric error code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,

    /// Short description of the failure
    #[serde(default)]
    pub message: String,

    /// Longer description, preferred over `message` when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Opaque extra payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcErrorObject {
    /// Create an error object carrying only a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            detail: None,
            data: None,
        }
    }

    /// Attach a detail text
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attach a numeric code
    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    /// The text a caller should see: `detail` if present, else `message`
    pub fn effective_message(&self) -> &str {
        self.detail.as_deref().unwrap_or(&self.message)
    }
}

impl std::fmt::Display for RpcErrorObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "[{}] {}", code, self.effective_message()),
            None => f.write_str(self.effective_message()),
        }
    }
}

impl std::error::Error for RpcErrorObject {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_detail_takes_precedence() {
        let error = RpcErrorObject::new("Y").with_detail("X");
        assert_eq!(error.effective_message(), "X");

        match Error::from(error) {
            Error::Rpc { message, .. } => assert_eq!(message, "X"),
            other => panic!("Expected Rpc error, got {:?}", other),
        }
    }

    #[test]
    fn test_message_used_without_detail() {
        let error = RpcErrorObject::new("Y");
        assert_eq!(Error::from(error).to_string(), "RPC error: Y");
    }

    #[test]
    fn test_error_object_deserialization() {
        let json = r#"{"code":1,"message":"Assert Exception","data":{"stack":[]}}"#;
        let error: RpcErrorObject = serde_json::from_str(json).unwrap();

        assert_eq!(error.code, Some(1));
        assert_eq!(error.message, "Assert Exception");
        assert!(error.detail.is_none());
        assert!(error.data.is_some());
    }

    #[test]
    fn test_error_object_missing_message() {
        let error: RpcErrorObject = serde_json::from_str(r#"{"detail":"only detail"}"#).unwrap();
        assert_eq!(error.message, "");
        assert_eq!(error.effective_message(), "only detail");
    }

    #[test]
    fn test_error_object_display() {
        let error = RpcErrorObject::new("missing").with_code(10);
        assert_eq!(format!("{}", error), "[10] missing");
        assert_eq!(format!("{}", RpcErrorObject::new("plain")), "plain");
    }

    #[test]
    fn test_transport_fault_classification() {
        assert!(Error::ConnectionClosed.is_transport_fault());
        assert!(Error::Transport("reset".into()).is_transport_fault());
        assert!(Error::Timeout(Duration::from_secs(1)).is_transport_fault());

        let not_retried = vec![
            Error::Connection {
                url: "ws://node".into(),
                reason: "refused".into(),
            },
            Error::Protocol("bad".into()),
            Error::Rpc {
                message: "nope".into(),
                code: None,
            },
            Error::NotFound("1.2.3".into()),
            Error::Serialization("bad".into()),
            Error::Config("bad".into()),
        ];
        for error in not_retried {
            assert!(!error.is_transport_fault(), "{:?} must not be retried", error);
        }
    }

    #[test]
    fn test_error_kinds_are_distinct() {
        let kinds = [
            Error::ConnectionClosed.kind(),
            Error::Transport(String::new()).kind(),
            Error::Timeout(Duration::ZERO).kind(),
            Error::Protocol(String::new()).kind(),
            Error::NotFound(String::new()).kind(),
        ];
        let unique: std::collections::HashSet<_> = kinds.iter().collect();
        assert_eq!(unique.len(), kinds.len());
    }

    #[test]
    fn test_connection_error_display() {
        let error = Error::Connection {
            url: "ws://127.0.0.1:1".into(),
            reason: "refused".into(),
        };
        let display = error.to_string();
        assert!(display.contains("ws://127.0.0.1:1"));
        assert!(display.contains("refused"));
    }
}
