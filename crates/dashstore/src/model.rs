//! # Domain Model: Documents, Identifiers and Write Policies
//!
//! A collection is an ordered JSON array of [`Document`]s. Each document is a JSON
//! object; the only field the store interprets is `id`.
//!
//! ## Identifiers
//!
//! An `id` is either an integer or a string ([`DocId`]). Comparison is strict:
//! `1` and `"1"` are different identifiers. Within a collection, every present
//! `id` is unique.
//!
//! Documents without an `id` are tolerated when a collection is written or read
//! wholesale (stat cards are replaced as a block and never addressed one by one),
//! but they cannot be targeted by `get_by_id`, `update` or `delete`.
//!
//! ## Per-Collection Policy
//!
//! Whether a collection assigns numeric ids and whether new documents go to the
//! head or the tail is not a property of the store. The caller passes it with
//! every `create` as [`CreateOptions`].
//!
//! ## Key Functions
//!
//! - [`validate_documents`]: id shape and uniqueness check for a whole sequence
//! - [`validate_collection_name`]: collection names become file names
//! - [`next_numeric_id`]: `max(existing integer ids) + 1`

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

use crate::error::{Result, StoreError};

pub const ID_FIELD: &str = "id";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocId {
    Int(i64),
    Text(String),
}

impl DocId {
    /// Interpret a raw JSON value as an identifier.
    /// Floats, booleans, null and containers are not identifiers.
    pub fn from_value(value: &Value) -> Option<DocId> {
        match value {
            Value::Number(n) => n.as_i64().map(DocId::Int),
            Value::String(s) => Some(DocId::Text(s.clone())),
            _ => None,
        }
    }

    /// Parse user-supplied text: integers become `Int`, anything else `Text`.
    pub fn parse_lenient(input: &str) -> DocId {
        match input.trim().parse::<i64>() {
            Ok(n) => DocId::Int(n),
            Err(_) => DocId::Text(input.to_string()),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            DocId::Int(n) => Value::from(*n),
            DocId::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocId::Int(n) => write!(f, "{}", n),
            DocId::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl From<i64> for DocId {
    fn from(n: i64) -> Self {
        DocId::Int(n)
    }
}

impl From<&str> for DocId {
    fn from(s: &str) -> Self {
        DocId::Text(s.to_string())
    }
}

impl From<String> for DocId {
    fn from(s: String) -> Self {
        DocId::Text(s)
    }
}

/// A JSON object stored in a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Accepts only JSON objects.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(StoreError::Validation(format!(
                "document must be a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn id(&self) -> Option<DocId> {
        self.0.get(ID_FIELD).and_then(DocId::from_value)
    }

    pub fn raw_id(&self) -> Option<&Value> {
        self.0.get(ID_FIELD)
    }

    pub fn set_id(&mut self, id: &DocId) {
        self.0.insert(ID_FIELD.to_string(), id.to_value());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// Shallow merge: every field of `partial` overwrites, except `id`.
    pub fn merge(&mut self, partial: &Document) {
        for (key, value) in &partial.0 {
            if key == ID_FIELD {
                continue;
            }
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl TryFrom<Value> for Document {
    type Error = StoreError;

    fn try_from(value: Value) -> Result<Self> {
        Document::from_value(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdKind {
    /// Missing ids are assigned as `max + 1`.
    #[default]
    Numeric,
    /// The caller must supply every id.
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Append (oldest first).
    #[default]
    Tail,
    /// Insert at index 0 (most recent first).
    Head,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CreateOptions {
    pub id_kind: IdKind,
    pub placement: Placement,
}

impl CreateOptions {
    pub fn numeric() -> Self {
        Self {
            id_kind: IdKind::Numeric,
            placement: Placement::Tail,
        }
    }

    pub fn text() -> Self {
        Self {
            id_kind: IdKind::Text,
            placement: Placement::Tail,
        }
    }

    pub fn at_head(mut self) -> Self {
        self.placement = Placement::Head;
        self
    }
}

/// Every present `id` must be an integer or a string, and unique.
pub fn validate_documents(docs: &[Document]) -> std::result::Result<(), String> {
    let mut seen = HashSet::new();
    for (pos, doc) in docs.iter().enumerate() {
        let Some(raw) = doc.raw_id() else {
            continue;
        };
        let id = DocId::from_value(raw).ok_or_else(|| {
            format!(
                "document at position {} has an invalid id (expected string or integer, got {})",
                pos,
                json_type_name(raw)
            )
        })?;
        if !seen.insert(id.clone()) {
            return Err(format!("duplicate id {} at position {}", id, pos));
        }
    }
    Ok(())
}

pub fn validate_collection_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(StoreError::Validation(
            "collection name cannot be empty".to_string(),
        ));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(StoreError::Validation(format!(
            "collection name '{}' contains invalid character '{}'",
            name, bad
        )));
    }
    Ok(())
}

/// `max(integer ids) + 1`; `1` for a collection without integer ids.
pub fn next_numeric_id(docs: &[Document]) -> Result<DocId> {
    let max = docs
        .iter()
        .filter_map(|d| match d.id() {
            Some(DocId::Int(n)) => Some(n),
            _ => None,
        })
        .max()
        .unwrap_or(0);
    max.max(0)
        .checked_add(1)
        .map(DocId::Int)
        .ok_or_else(|| StoreError::Validation("numeric id space exhausted".to_string()))
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
