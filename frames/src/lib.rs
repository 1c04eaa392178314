//! Shared request model and MessagePack codec for flock endpoints.
//!
//! This crate owns the wire representation spoken on every request/reply
//! channel. Payloads stay flexible (`serde_json::Value`) in memory and travel
//! as MessagePack maps with named fields, so any endpoint that speaks
//! MessagePack can read `cmd`, `subcmd` and `data` by key.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error returned by the encode/decode helpers.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The value could not be written as MessagePack.
    #[error("failed to encode msgpack payload: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    /// The raw bytes are not a MessagePack document of the expected shape.
    #[error("failed to decode msgpack payload: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// A single request sent on a request/reply channel.
///
/// `subcmd` is empty when the command line carried no `.subcommand` part, and
/// `data` holds either the raw tail string or a parsed literal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Command name, e.g. `"echo"`.
    pub cmd: String,
    /// Optional subcommand, e.g. `"ping"`; empty string when absent.
    #[serde(default)]
    pub subcmd: String,
    /// Arbitrary payload.
    #[serde(default)]
    pub data: Value,
}

impl Request {
    #[must_use]
    pub fn new(cmd: impl Into<String>, subcmd: impl Into<String>, data: Value) -> Self {
        Self {
            cmd: cmd.into(),
            subcmd: subcmd.into(),
            data,
        }
    }
}

/// Encode a request into MessagePack bytes.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialization fails.
pub fn encode_request(request: &Request) -> Result<Vec<u8>, CodecError> {
    Ok(rmp_serde::to_vec_named(request)?)
}

/// Decode MessagePack bytes into a request. Used by endpoints and test peers.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed bytes or a map without `cmd`.
pub fn decode_request(bytes: &[u8]) -> Result<Request, CodecError> {
    Ok(rmp_serde::from_slice(bytes)?)
}

/// Encode an arbitrary reply value into MessagePack bytes.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialization fails.
pub fn encode_reply(value: &Value) -> Result<Vec<u8>, CodecError> {
    Ok(rmp_serde::to_vec_named(value)?)
}

/// Decode a reply into a JSON value.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed bytes and for MessagePack
/// values that have no JSON counterpart (binary blobs, non-string map keys).
pub fn decode_reply(bytes: &[u8]) -> Result<Value, CodecError> {
    Ok(rmp_serde::from_slice(bytes)?)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
