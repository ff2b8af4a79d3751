//! Response Decoder
//!
//! Walks a parsed response envelope and produces typed DTOs together with the
//! links embedded next to them.
//!
//! Envelope layout:
//!
//! ```text
//! { "type": "domains", "status": "ok", "data": [...], "messages": [...] }
//! ```
//!
//! The API root's `data` is itself a link map; every other resource carries
//! its links under `data.links`.

use super::dto::ResourceDto;
use super::link::LinkMap;
use crate::error::{ClientError, Result};
use crate::rest::payload::{JsonParser, PayloadParser};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Server message attached to a response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default, deserialize_with = "lenient_exit_code")]
    pub exit_code: Option<i64>,
}

/// Some brokers send exit codes as strings
fn lenient_exit_code<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// A DTO and the operations the server offers on it
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub dto: T,
    pub links: LinkMap,
}

/// Parsed response envelope, not yet narrowed to a resource shape
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    kind: Option<String>,
    status: Option<String>,
    data: Value,
    messages: Vec<Message>,
}

impl Envelope {
    /// Envelope of an empty response body
    pub fn empty() -> Self {
        Self {
            kind: None,
            status: None,
            data: Value::Null,
            messages: Vec::new(),
        }
    }

    pub fn from_node(node: Value) -> Result<Self> {
        let mut map = match node {
            Value::Null => return Ok(Self::empty()),
            Value::Object(map) => map,
            other => {
                return Err(ClientError::MalformedResponse(format!(
                    "expected a response object, got {}",
                    type_name(&other)
                )))
            }
        };

        let kind = map.get("type").and_then(|v| v.as_str()).map(|s| s.to_string());
        let status = map.get("status").and_then(|v| v.as_str()).map(|s| s.to_string());
        let messages = match map.remove("messages") {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|m| match serde_json::from_value::<Message>(m.clone()) {
                    Ok(message) => Some(message),
                    Err(e) => {
                        tracing::warn!("Dropping unreadable server message {}: {}", m, e);
                        None
                    }
                })
                .collect(),
            _ => Vec::new(),
        };
        let data = map.remove("data").unwrap_or(Value::Null);

        Ok(Self {
            kind,
            status,
            data,
            messages,
        })
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// All message texts joined for error reporting
    pub fn message_text(&self) -> String {
        self.messages
            .iter()
            .filter_map(|m| m.text.as_deref())
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// First non-zero exit code reported by the server
    pub fn exit_code(&self) -> Option<i64> {
        self.messages
            .iter()
            .filter_map(|m| m.exit_code)
            .find(|code| *code != 0)
    }

    /// Links offered by this response.
    ///
    /// An absent links section yields an empty map: the server offers no
    /// further operations.
    pub fn links(&self) -> Result<LinkMap> {
        if self.kind.as_deref() == Some("links") {
            return LinkMap::from_node(&self.data);
        }
        match self.data.get("links") {
            Some(node) => LinkMap::from_node(node),
            None => Ok(LinkMap::new()),
        }
    }

    fn expect_kind(&self, expected: &str) -> Result<()> {
        match self.kind.as_deref() {
            Some(kind) if kind != expected => Err(ClientError::MalformedResponse(format!(
                "expected '{}' response, got '{}'",
                expected, kind
            ))),
            _ => Ok(()),
        }
    }

    /// Narrow to a single resource
    pub fn into_resource<T: ResourceDto>(self) -> Result<Decoded<T>> {
        self.expect_kind(T::KIND.wire_type())?;
        if !self.data.is_object() {
            return Err(ClientError::MalformedResponse(format!(
                "expected {} object, got {}",
                T::KIND.wire_type(),
                type_name(&self.data)
            )));
        }
        decode_element(&self.data)
    }

    /// Narrow to a single resource when the server chose to return one
    pub fn into_optional_resource<T: ResourceDto>(self) -> Result<Option<Decoded<T>>> {
        if self.data.is_null() {
            return Ok(None);
        }
        self.into_resource().map(Some)
    }

    /// Narrow to an ordered list of resources, preserving server order
    pub fn into_list<T: ResourceDto>(self) -> Result<Vec<Decoded<T>>> {
        self.expect_kind(T::KIND.wire_list_type())?;
        match &self.data {
            Value::Array(items) => items.iter().map(decode_element::<T>).collect(),
            Value::Null => Ok(Vec::new()),
            other => Err(ClientError::MalformedResponse(format!(
                "expected {} list, got {}",
                T::KIND.wire_list_type(),
                type_name(other)
            ))),
        }
    }
}

fn decode_element<T: ResourceDto>(node: &Value) -> Result<Decoded<T>> {
    let dto = T::from_node(node)?;
    let links = match node.get("links") {
        Some(links) => LinkMap::from_node(links)?,
        None => LinkMap::new(),
    };
    Ok(Decoded { dto, links })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parses payloads with the configured parser and wraps them as envelopes
#[derive(Clone)]
pub struct ResponseDecoder {
    parser: Arc<dyn PayloadParser>,
}

impl ResponseDecoder {
    pub fn new(parser: Arc<dyn PayloadParser>) -> Self {
        Self { parser }
    }

    pub fn json() -> Self {
        Self::new(Arc::new(JsonParser))
    }

    pub fn media_type(&self) -> &'static str {
        self.parser.media_type()
    }

    pub fn envelope(&self, payload: &[u8]) -> Result<Envelope> {
        Envelope::from_node(self.parser.parse(payload)?)
    }

    pub fn decode<T: ResourceDto>(&self, payload: &[u8]) -> Result<Decoded<T>> {
        self.envelope(payload)?.into_resource()
    }

    pub fn decode_list<T: ResourceDto>(&self, payload: &[u8]) -> Result<Vec<Decoded<T>>> {
        self.envelope(payload)?.into_list()
    }
}

impl Default for ResponseDecoder {
    fn default() -> Self {
        Self::json()
    }
}
