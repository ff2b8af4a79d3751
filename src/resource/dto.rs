//! Data-transfer objects
//!
//! Immutable snapshots of server state, one per resource kind. Resource
//! objects copy what they need out of these.

use crate::error::{ClientError, Result};
use serde_json::Value;

/// Shape a response is decoded into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Api,
    User,
    Domain,
    Key,
}

impl ResourceKind {
    /// Envelope `type` of a single resource
    pub fn wire_type(&self) -> &'static str {
        match self {
            ResourceKind::Api => "links",
            ResourceKind::User => "user",
            ResourceKind::Domain => "domain",
            ResourceKind::Key => "key",
        }
    }

    /// Envelope `type` of a list of resources
    pub fn wire_list_type(&self) -> &'static str {
        match self {
            ResourceKind::Api => "links",
            ResourceKind::User => "users",
            ResourceKind::Domain => "domains",
            ResourceKind::Key => "keys",
        }
    }
}

/// Extracts a typed snapshot from one resource node
pub trait ResourceDto: Sized {
    const KIND: ResourceKind;

    fn from_node(node: &Value) -> Result<Self>;
}

fn required_str(node: &Value, field: &str, kind: ResourceKind) -> Result<String> {
    node.get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            ClientError::MalformedResponse(format!(
                "{} is missing required field '{}'",
                kind.wire_type(),
                field
            ))
        })
}

fn optional_str(node: &Value, field: &str) -> Option<String> {
    node.get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Domain snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainDto {
    pub id: String,
    pub suffix: Option<String>,
}

impl ResourceDto for DomainDto {
    const KIND: ResourceKind = ResourceKind::Domain;

    fn from_node(node: &Value) -> Result<Self> {
        // Older brokers report the domain name as "namespace"
        let id = match optional_str(node, "id") {
            Some(id) => id,
            None => required_str(node, "namespace", Self::KIND)?,
        };
        Ok(Self {
            id,
            suffix: optional_str(node, "suffix"),
        })
    }
}

/// User snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDto {
    pub login: String,
}

impl ResourceDto for UserDto {
    const KIND: ResourceKind = ResourceKind::User;

    fn from_node(node: &Value) -> Result<Self> {
        Ok(Self {
            login: required_str(node, "login", Self::KIND)?,
        })
    }
}

/// SSH key snapshot; the type is kept as the raw wire value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDto {
    pub name: String,
    pub key_type: String,
    pub content: String,
}

impl ResourceDto for KeyDto {
    const KIND: ResourceKind = ResourceKind::Key;

    fn from_node(node: &Value) -> Result<Self> {
        Ok(Self {
            name: required_str(node, "name", Self::KIND)?,
            key_type: required_str(node, "type", Self::KIND)?,
            content: required_str(node, "content", Self::KIND)?,
        })
    }
}
