//! Record types read from a store.

use crate::CollectionName;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Type of the identifier column of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdType {
    #[default]
    Int,
    String,
}

/// Unique, totally ordered record identifier.
///
/// Integer ids order before string ids; within a variant the natural
/// order applies.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Str(String),
}

impl RecordId {
    /// Parse a raw token (e.g. a cursor query parameter) as an id of the
    /// given type. Returns `None` when the token cannot be such an id.
    pub fn parse(id_type: IdType, raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        match id_type {
            IdType::Int => raw.parse().ok().map(RecordId::Int),
            IdType::String => Some(RecordId::Str(raw.to_string())),
        }
    }

    /// The id as a JSON value, for comparison against field values.
    pub fn to_value(&self) -> Value {
        match self {
            RecordId::Int(i) => Value::from(*i),
            RecordId::Str(s) => Value::String(s.clone()),
        }
    }

    /// Interpret a JSON value as an id, if it has an id shape.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(RecordId::Int),
            Value::String(s) => Some(RecordId::Str(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(i) => write!(f, "{i}"),
            RecordId::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::Int(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId::Str(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        RecordId::Str(id)
    }
}

/// A record owned by a store. The engine only ever reads records.
///
/// Serializes as a flat object: `{"id": .., <fields>..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier for this record
    pub id: RecordId,
    /// Collection this record belongs to
    #[serde(skip)]
    pub collection: CollectionName,
    /// Named field values
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Create a new record from a JSON object payload.
    ///
    /// Non-object payloads produce a record without fields.
    pub fn new(
        id: impl Into<RecordId>,
        collection: impl Into<CollectionName>,
        payload: Value,
    ) -> Self {
        let fields = match payload {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: id.into(),
            collection: collection.into(),
            fields,
        }
    }

    /// Look up a top-level or dotted field path.
    pub fn field(&self, path: &str) -> Option<&Value> {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        crate::value::resolve_path(&self.fields, &segments)
    }

    /// Payload as a JSON object value.
    pub fn payload(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}
