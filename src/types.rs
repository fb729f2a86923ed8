//! Core domain types for recorded event graphs.
//!
//! Nodes and edges carry a small typed schema (`node type`, `method`,
//! `edge type`, `value`, `id`) plus an opaque extension map holding any other
//! attributes the input document declared, so the viewer can print them back.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Attribute name of a node's kind marker.
pub const ATTR_NODE_TYPE: &str = "node type";
/// Attribute name of an API node's method.
pub const ATTR_METHOD: &str = "method";
/// Attribute name of an edge's kind.
pub const ATTR_EDGE_TYPE: &str = "edge type";
/// Attribute name of the string recorded on an edge.
pub const ATTR_VALUE: &str = "value";
/// Attribute name of the sequence id (edges, and optionally nodes).
pub const ATTR_ID: &str = "id";

// ---------------------------------------------------------------------------
// AttrValue
// ---------------------------------------------------------------------------

/// A typed attribute value as declared by the input document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view; strings holding a decimal integer are accepted too.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => Value::from(*f),
            Self::String(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// EdgeKey
// ---------------------------------------------------------------------------

/// Disambiguating key of a parallel edge between the same two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EdgeKey {
    Int(i64),
    Str(String),
}

impl EdgeKey {
    /// Parse an XML edge id: integers when possible, strings otherwise.
    pub fn parse(raw: &str) -> Self {
        raw.parse()
            .map(Self::Int)
            .unwrap_or_else(|_| Self::Str(raw.to_string()))
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// EventNode
// ---------------------------------------------------------------------------

/// A node of the event graph.
#[derive(Debug, Clone, PartialEq)]
pub struct EventNode {
    pub id: String,
    pub node_type: Option<String>,
    pub method: Option<String>,
    /// The node's own sequence id, when the recorder emitted one.
    pub seq: Option<i64>,
    pub extra: BTreeMap<String, AttrValue>,
}

impl EventNode {
    /// A node with no attributes at all.
    pub fn bare(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: None,
            method: None,
            seq: None,
            extra: BTreeMap::new(),
        }
    }

    /// Split the core schema out of a raw attribute map.
    pub fn from_attributes(id: impl Into<String>, mut attrs: BTreeMap<String, AttrValue>) -> Self {
        let node_type = take_string(&mut attrs, ATTR_NODE_TYPE);
        let method = take_string(&mut attrs, ATTR_METHOD);
        let seq = match attrs.get(ATTR_ID).and_then(AttrValue::as_int) {
            Some(seq) => {
                attrs.remove(ATTR_ID);
                Some(seq)
            }
            None => None,
        };
        Self {
            id: id.into(),
            node_type,
            method,
            seq,
            extra: attrs,
        }
    }

    /// All attributes, core schema included, as a JSON object.
    pub fn attributes(&self) -> Map<String, Value> {
        let mut map = extra_to_json(&self.extra);
        if let Some(node_type) = &self.node_type {
            map.insert(ATTR_NODE_TYPE.into(), Value::String(node_type.clone()));
        }
        if let Some(method) = &self.method {
            map.insert(ATTR_METHOD.into(), Value::String(method.clone()));
        }
        if let Some(seq) = self.seq {
            map.insert(ATTR_ID.into(), Value::from(seq));
        }
        map
    }
}

// ---------------------------------------------------------------------------
// EventEdge
// ---------------------------------------------------------------------------

/// An edge of the event graph. `seq` is the temporal order of the event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventEdge {
    pub key: EdgeKey,
    pub edge_type: Option<String>,
    pub value: Option<String>,
    pub seq: i64,
    pub extra: BTreeMap<String, AttrValue>,
}

impl EventEdge {
    pub fn new(key: EdgeKey, seq: i64) -> Self {
        Self {
            key,
            edge_type: None,
            value: None,
            seq,
            extra: BTreeMap::new(),
        }
    }

    /// Split the core schema out of a raw attribute map.
    ///
    /// Returns `None` when the mandatory integer `id` is missing.
    pub fn from_attributes(key: EdgeKey, mut attrs: BTreeMap<String, AttrValue>) -> Option<Self> {
        let seq = attrs.remove(ATTR_ID)?.as_int()?;
        let edge_type = take_string(&mut attrs, ATTR_EDGE_TYPE);
        let value = attrs.remove(ATTR_VALUE).map(|v| v.to_string());
        Some(Self {
            key,
            edge_type,
            value,
            seq,
            extra: attrs,
        })
    }

    pub fn with_type(mut self, edge_type: impl Into<String>) -> Self {
        self.edge_type = Some(edge_type.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// The recorded value, or `""` when the edge carries none.
    pub fn value_or_empty(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }

    /// All attributes, core schema included, as a JSON object.
    pub fn attributes(&self) -> Map<String, Value> {
        let mut map = extra_to_json(&self.extra);
        if let Some(edge_type) = &self.edge_type {
            map.insert(ATTR_EDGE_TYPE.into(), Value::String(edge_type.clone()));
        }
        if let Some(value) = &self.value {
            map.insert(ATTR_VALUE.into(), Value::String(value.clone()));
        }
        map.insert(ATTR_ID.into(), Value::from(self.seq));
        map
    }
}

// ---------------------------------------------------------------------------
// EdgeDescriptor
// ---------------------------------------------------------------------------

/// Graph-resolvable reference to one edge: `[origin, destination, key, id]`.
///
/// Serialized as a JSON array. The trailing sequence id is optional on input
/// so three-element descriptors are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeDescriptor {
    pub origin: String,
    pub destination: String,
    pub key: EdgeKey,
    pub seq: Option<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DescriptorRepr {
    Full(String, String, EdgeKey, i64),
    Short(String, String, EdgeKey),
}

impl Serialize for EdgeDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.seq {
            Some(seq) => (&self.origin, &self.destination, &self.key, seq).serialize(serializer),
            None => (&self.origin, &self.destination, &self.key).serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for EdgeDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match DescriptorRepr::deserialize(deserializer)? {
            DescriptorRepr::Full(origin, destination, key, seq) => Self {
                origin,
                destination,
                key,
                seq: Some(seq),
            },
            DescriptorRepr::Short(origin, destination, key) => Self {
                origin,
                destination,
                key,
                seq: None,
            },
        })
    }
}

impl fmt::Display for EdgeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.origin, self.destination, self.key)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn take_string(attrs: &mut BTreeMap<String, AttrValue>, name: &str) -> Option<String> {
    match attrs.get(name) {
        Some(AttrValue::String(_)) => match attrs.remove(name) {
            Some(AttrValue::String(s)) => Some(s),
            _ => None,
        },
        _ => None,
    }
}

fn extra_to_json(extra: &BTreeMap<String, AttrValue>) -> Map<String, Value> {
    extra
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
