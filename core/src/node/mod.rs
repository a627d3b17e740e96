#![deny(missing_docs)]

//! # Document Nodes
//!
//! The generic tree every YAML/JSON document is decoded into before
//! dereferencing.
//!
//! - **decode**: text -> `Node` conversion for both syntaxes.
//! - **timestamp**: the date/time scalar kept distinct from strings.

pub mod decode;
pub mod timestamp;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;

pub use decode::{decode_document, Syntax};
pub use timestamp::{Timestamp, TimestampValue};

/// Ordered mapping with unique string keys. Insertion order is the source order.
pub type Mapping = IndexMap<String, Node>;

/// A fully decoded (and, after dereferencing, fully merged) document.
pub type Document = Node;

/// A document tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Ordered key/value mapping.
    Mapping(Mapping),
    /// Ordered sequence.
    Sequence(Vec<Node>),
    /// Leaf value.
    Scalar(Scalar),
}

/// A leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// `null` / `~`.
    Null,
    /// `true` / `false`.
    Bool(bool),
    /// Any numeric literal.
    Number(Number),
    /// A plain or quoted string.
    String(String),
    /// A date or date-time literal.
    Timestamp(Timestamp),
}

/// A numeric literal, keeping the integer/float distinction of the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Negative or small integer.
    Int(i64),
    /// Integer above `i64::MAX`.
    UInt(u64),
    /// Floating point (including `.inf` / `.nan` from YAML).
    Float(f64),
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{}", n),
            Number::UInt(n) => write!(f, "{}", n),
            Number::Float(n) => write!(f, "{}", n),
        }
    }
}

impl Node {
    /// Shorthand for a string scalar.
    pub fn string(value: impl Into<String>) -> Self {
        Node::Scalar(Scalar::String(value.into()))
    }

    /// Returns the mapping if this node is one.
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the sequence if this node is one.
    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the string value of a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Returns the timestamp value of a timestamp scalar.
    pub fn as_timestamp(&self) -> Option<&Timestamp> {
        match self {
            Node::Scalar(Scalar::Timestamp(ts)) => Some(ts),
            _ => None,
        }
    }

    /// Looks up a key in a mapping node.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Returns `true` when any mapping in this tree still holds a string `$ref`.
    pub fn contains_reference(&self) -> bool {
        match self {
            Node::Mapping(map) => {
                matches!(map.get("$ref"), Some(Node::Scalar(Scalar::String(_))))
                    || map.values().any(Node::contains_reference)
            }
            Node::Sequence(items) => items.iter().any(Node::contains_reference),
            Node::Scalar(_) => false,
        }
    }

    /// Converts the tree into a `serde_json::Value` for consumers that work on JSON.
    ///
    /// Timestamps become their original text; non-finite floats become `null`.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Node::Mapping(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Node::Sequence(items) => JsonValue::Array(items.iter().map(Node::to_json).collect()),
            Node::Scalar(scalar) => match scalar {
                Scalar::Null => JsonValue::Null,
                Scalar::Bool(b) => JsonValue::Bool(*b),
                Scalar::Number(Number::Int(n)) => JsonValue::from(*n),
                Scalar::Number(Number::UInt(n)) => JsonValue::from(*n),
                Scalar::Number(Number::Float(n)) => serde_json::Number::from_f64(*n)
                    .map(JsonValue::Number)
                    .unwrap_or(JsonValue::Null),
                Scalar::String(s) => JsonValue::String(s.clone()),
                Scalar::Timestamp(ts) => JsonValue::String(ts.as_str().to_string()),
            },
        }
    }
}

impl From<Mapping> for Node {
    fn from(map: Mapping) -> Self {
        Node::Mapping(map)
    }
}

impl From<Scalar> for Node {
    fn from(scalar: Scalar) -> Self {
        Node::Scalar(scalar)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Mapping(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Node::Sequence(items) => {
                let mut out = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    out.serialize_element(item)?;
                }
                out.end()
            }
            Node::Scalar(scalar) => scalar.serialize(serializer),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Null => serializer.serialize_unit(),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Number(Number::Int(n)) => serializer.serialize_i64(*n),
            Scalar::Number(Number::UInt(n)) => serializer.serialize_u64(*n),
            Scalar::Number(Number::Float(n)) => serializer.serialize_f64(*n),
            Scalar::String(s) => serializer.serialize_str(s),
            Scalar::Timestamp(ts) => ts.serialize(serializer),
        }
    }
}
