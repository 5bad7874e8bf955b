//! Encoding of call envelopes and decoding of node replies
//!
//! Decoding is where the client draws the line between "the payload is
//! broken" and "the node said no":
//!
//! - bytes that are not JSON, or JSON that is not an object → `Error::Protocol`
//! - an object with a non-null `error` member → `ReplyOutcome::Error`
//! - an object with a `result` member (even `null`) → `ReplyOutcome::Result`
//! - an object with neither → `Error::Protocol`
//!
//! Raw control characters inside strings are accepted; some nodes put
//! unescaped newlines in error details.
//!
//! # Examples
//!
//! ```rust
//! use gwrpc_core::{codec, ReplyOutcome};
//!
//! let reply = codec::decode_reply(br#"{"id":4,"result":[null]}"#).unwrap();
//! assert_eq!(reply.id, Some(4));
//! assert_eq!(reply.outcome, ReplyOutcome::Result(serde_json::json!([null])));
//!
//! assert!(codec::decode_reply(b"{\"id\":4,\"res").is_err());
//! ```

use crate::error::{Error, Result, RpcErrorObject};
use crate::types::{ReplyOutcome, RpcEnvelope, RpcReply};
use serde::Serialize;

/// Text of the protocol error raised for payloads that are not JSON
pub const INVALID_JSON: &str = "invalid format, expected JSON";

/// Encode any serializable message to a JSON string
pub fn encode<T: Serialize>(msg: &T) -> Result<String> {
    serde_json::to_string(msg).map_err(|e| Error::Serialization(e.to_string()))
}

/// Encode a call envelope for a text frame
pub fn encode_envelope(envelope: &RpcEnvelope) -> Result<String> {
    encode(envelope)
}

/// Decode the payload of one inbound frame into a reply
///
/// # Errors
///
/// `Error::Protocol` when the payload is not JSON, is not an object, has a
/// malformed `error` member, or carries neither `result` nor `error`.
pub fn decode_reply(data: &[u8]) -> Result<RpcReply> {
    let value = parse_lenient(data)?;

    let serde_json::Value::Object(mut fields) = value else {
        return Err(Error::Protocol(format!(
            "expected a reply object, got {}",
            json_kind(&value)
        )));
    };

    let id = fields.get("id").and_then(serde_json::Value::as_u64);

    match fields.remove("error") {
        None | Some(serde_json::Value::Null) => {}
        Some(error) => {
            return Ok(RpcReply {
                id,
                outcome: ReplyOutcome::Error(decode_error_object(error)?),
            })
        }
    }

    match fields.remove("result") {
        Some(result) => Ok(RpcReply {
            id,
            outcome: ReplyOutcome::Result(result),
        }),
        None => Err(Error::Protocol(
            "reply carries neither result nor error".to_string(),
        )),
    }
}

fn parse_lenient(data: &[u8]) -> Result<serde_json::Value> {
    match serde_json::from_slice(data) {
        Ok(value) => Ok(value),
        Err(_) => escape_raw_controls(data)
            .and_then(|escaped| serde_json::from_slice(&escaped).ok())
            .ok_or_else(|| Error::Protocol(INVALID_JSON.to_string())),
    }
}

/// Copy of `data` with control bytes inside strings written as `\u00XX`
///
/// `None` when there is nothing to escape.
fn escape_raw_controls(data: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() + 16);
    let mut in_string = false;
    let mut after_backslash = false;
    let mut changed = false;

    for &byte in data {
        if in_string {
            if after_backslash {
                after_backslash = false;
            } else if byte == b'\\' {
                after_backslash = true;
            } else if byte == b'"' {
                in_string = false;
            } else if byte < 0x20 {
                out.extend_from_slice(format!("\\u{:04x}", byte).as_bytes());
                changed = true;
                continue;
            }
        } else if byte == b'"' {
            in_string = true;
        }
        out.push(byte);
    }

    changed.then_some(out)
}

// Some gateways send the error as a bare string.
fn decode_error_object(error: serde_json::Value) -> Result<RpcErrorObject> {
    match error {
        serde_json::Value::String(message) => Ok(RpcErrorObject::new(message)),
        other => serde_json::from_value(other)
            .map_err(|e| Error::Protocol(format!("malformed error member: {}", e))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
