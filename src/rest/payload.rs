//! Payload parsing
//!
//! Turns raw response bytes into the generic node tree the decoder walks.

use crate::error::{ClientError, Result};
use serde_json::Value;

/// Parses raw payload bytes into a structured node tree
pub trait PayloadParser: Send + Sync {
    /// Media type sent in the `Accept` header
    fn media_type(&self) -> &'static str;

    /// Parse a payload. An empty payload yields `Value::Null`.
    fn parse(&self, payload: &[u8]) -> Result<Value>;
}

/// JSON payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl PayloadParser for JsonParser {
    fn media_type(&self) -> &'static str {
        "application/json"
    }

    fn parse(&self, payload: &[u8]) -> Result<Value> {
        if payload.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(payload)
            .map_err(|e| ClientError::MalformedResponse(format!("invalid JSON payload: {}", e)))
    }
}
