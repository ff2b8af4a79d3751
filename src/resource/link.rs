//! Link descriptors
//!
//! A [`Link`] describes one operation the server currently permits on a
//! resource. Links arrive in every response as a map keyed by operation name
//! and are never modified afterwards.

use crate::error::{ClientError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// HTTP method a link must be invoked with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether parameters travel in the query string rather than the body
    pub fn encodes_in_query(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Delete)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared type of a link parameter
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum ParameterType {
    #[default]
    String,
    Boolean,
    Integer,
    /// Any type this client does not check (e.g. `array`)
    Other(String),
}

impl From<String> for ParameterType {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "string" => ParameterType::String,
            "boolean" => ParameterType::Boolean,
            "integer" => ParameterType::Integer,
            _ => ParameterType::Other(value),
        }
    }
}

impl ParameterType {
    fn accepts(&self, value: &ParameterValue) -> bool {
        match (self, value) {
            (ParameterType::String, ParameterValue::String(_)) => true,
            (ParameterType::Boolean, ParameterValue::Boolean(_)) => true,
            (ParameterType::Integer, ParameterValue::Integer(_)) => true,
            (ParameterType::Other(_), _) => true,
            _ => false,
        }
    }
}

/// One parameter accepted by a link
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinkParameter {
    pub name: String,
    #[serde(rename = "type", default)]
    pub param_type: ParameterType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub valid_options: Vec<Value>,
    #[serde(default)]
    pub default_value: Option<Value>,
}

impl LinkParameter {
    pub fn new(name: &str, param_type: ParameterType) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            description: None,
            valid_options: Vec::new(),
            default_value: None,
        }
    }
}

/// Link as it appears on the wire; the name is the key of the enclosing map
#[derive(Debug, Deserialize)]
struct WireLink {
    #[serde(default)]
    rel: Option<String>,
    method: HttpMethod,
    href: String,
    #[serde(default)]
    required_params: Vec<LinkParameter>,
    #[serde(default)]
    optional_params: Vec<LinkParameter>,
}

/// Immutable description of one server-exposed operation
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    name: String,
    rel: Option<String>,
    method: HttpMethod,
    href: String,
    required: Vec<LinkParameter>,
    optional: Vec<LinkParameter>,
}

impl Link {
    pub fn new(name: &str, method: HttpMethod, href: &str) -> Self {
        Self {
            name: name.to_string(),
            rel: None,
            method,
            href: href.to_string(),
            required: Vec::new(),
            optional: Vec::new(),
        }
    }

    pub fn with_required(mut self, name: &str, param_type: ParameterType) -> Self {
        self.required.push(LinkParameter::new(name, param_type));
        self
    }

    pub fn with_optional(mut self, name: &str, param_type: ParameterType) -> Self {
        self.optional.push(LinkParameter::new(name, param_type));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable relation text supplied by the server
    pub fn rel(&self) -> Option<&str> {
        self.rel.as_deref()
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn required_params(&self) -> &[LinkParameter] {
        &self.required
    }

    pub fn optional_params(&self) -> &[LinkParameter] {
        &self.optional
    }

    fn declared(&self, name: &str) -> Option<&LinkParameter> {
        self.required
            .iter()
            .chain(self.optional.iter())
            .find(|p| p.name == name)
    }

    /// Check that `params` covers every required parameter and nothing unknown.
    pub fn validate(&self, params: &Parameters) -> Result<()> {
        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|p| !params.contains(&p.name))
            .map(|p| p.name.clone())
            .collect();

        let mut unexpected = Vec::new();
        let mut mistyped = Vec::new();
        for (name, value) in params.iter() {
            match self.declared(name) {
                None => unexpected.push(name.to_string()),
                Some(declared) if !declared.param_type.accepts(value) => {
                    mistyped.push(name.to_string())
                }
                Some(_) => {}
            }
        }

        if missing.is_empty() && unexpected.is_empty() && mistyped.is_empty() {
            return Ok(());
        }

        Err(ClientError::ParameterMismatch {
            link: self.name.clone(),
            missing,
            unexpected,
            mistyped,
        })
    }

    /// Names written as `{name}` in the href
    pub fn path_parameters(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut rest = self.href.as_str();
        while let Some(start) = rest.find('{') {
            let after = &rest[start + 1..];
            let Some(end) = after.find('}') else {
                break;
            };
            names.push(&after[..end]);
            rest = &after[end + 1..];
        }
        names
    }
}

/// Every operation currently permitted on a resource, keyed by name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkMap {
    links: BTreeMap<String, Link>,
}

impl LinkMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a wire `links` object. All entries succeed or the whole map fails.
    pub fn from_node(node: &Value) -> Result<Self> {
        if node.is_null() {
            return Ok(Self::default());
        }

        let wire: BTreeMap<String, WireLink> = serde_json::from_value(node.clone())
            .map_err(|e| ClientError::MalformedResponse(format!("invalid links section: {}", e)))?;

        let links = wire
            .into_iter()
            .map(|(name, w)| {
                let link = Link {
                    name: name.clone(),
                    rel: w.rel,
                    method: w.method,
                    href: w.href,
                    required: w.required_params,
                    optional: w.optional_params,
                };
                (name, link)
            })
            .collect();

        Ok(Self { links })
    }

    pub fn insert(&mut self, link: Link) {
        self.links.insert(link.name.clone(), link);
    }

    pub fn get(&self, name: &str) -> Option<&Link> {
        self.links.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.links.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.links.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl FromIterator<Link> for LinkMap {
    fn from_iter<I: IntoIterator<Item = Link>>(iter: I) -> Self {
        let mut map = LinkMap::new();
        for link in iter {
            map.insert(link);
        }
        map
    }
}

/// Typed value supplied for a link parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    String(String),
    Boolean(bool),
    Integer(i64),
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::String(s) => f.write_str(s),
            ParameterValue::Boolean(b) => write!(f, "{}", b),
            ParameterValue::Integer(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::String(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        ParameterValue::String(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        ParameterValue::Boolean(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        ParameterValue::Integer(value)
    }
}

/// Ordered set of named parameter values. Names are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    entries: Vec<(String, ParameterValue)>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, replacing any earlier value with the same name
    pub fn with(mut self, name: &str, value: impl Into<ParameterValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<ParameterValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
