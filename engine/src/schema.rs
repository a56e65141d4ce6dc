//! Schema definition and typed field access.
//!
//! Schemas describe which fields a collection has, which of them are
//! associations, and which may be used as sort keys. Each collection
//! schema carries a table of field accessors built once, so the
//! pagination engine never parses field paths per record.

use crate::{error::Result, CollectionName, Error, IdType, Record, RecordId, SchemaVersion};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;

/// Field types supported in schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    Timestamp,
    /// Arbitrary nested JSON
    Json,
    /// Id of a record in another collection
    Reference,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::String => write!(f, "String"),
            FieldType::Int => write!(f, "Int"),
            FieldType::Float => write!(f, "Float"),
            FieldType::Bool => write!(f, "Bool"),
            FieldType::Timestamp => write!(f, "Timestamp"),
            FieldType::Json => write!(f, "Json"),
            FieldType::Reference => write!(f, "Reference"),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Definition of a field in a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Field type
    pub field_type: FieldType,
    /// Whether this field is required
    #[serde(default)]
    pub required: bool,
    /// Whether callers may sort by this field
    #[serde(default = "default_true")]
    pub sortable: bool,
    /// Target collection, for association fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<CollectionName>,
    /// Id type of the target collection, filled in by [`Schema`]
    #[serde(skip)]
    pub target_id_type: Option<IdType>,
}

impl FieldDef {
    /// Create a new required field definition.
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
            sortable: true,
            references: None,
            target_id_type: None,
        }
    }

    /// Create a new optional field definition.
    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            required: false,
            ..Self::required(name, field_type)
        }
    }

    /// Create an optional association to another collection.
    pub fn reference(name: impl Into<String>, target: impl Into<CollectionName>) -> Self {
        Self {
            references: Some(target.into()),
            ..Self::optional(name, FieldType::Reference)
        }
    }

    /// Exclude this field from sorting.
    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    /// Whether this field is an association rather than a plain field.
    pub fn is_association(&self) -> bool {
        self.field_type == FieldType::Reference
    }

    /// Validate a JSON value against this field definition.
    pub fn validate(&self, value: Option<&Value>) -> Result<()> {
        match value {
            None if self.required => Err(Error::MissingRequiredField(self.name.clone())),
            None => Ok(()),
            Some(Value::Null) if self.required => {
                Err(Error::MissingRequiredField(self.name.clone()))
            }
            Some(Value::Null) => Ok(()),
            Some(v) => self.validate_type(v),
        }
    }

    fn validate_type(&self, value: &Value) -> Result<()> {
        let valid = match self.field_type {
            FieldType::String => value.is_string(),
            FieldType::Int => value.is_i64() || value.is_u64(),
            FieldType::Float => value.is_f64() || value.is_i64() || value.is_u64(),
            FieldType::Bool => value.is_boolean(),
            FieldType::Timestamp => value.is_u64() || value.is_i64(),
            FieldType::Json => true,
            FieldType::Reference => RecordId::from_value(value).is_some(),
        };

        if valid {
            Ok(())
        } else {
            Err(Error::TypeMismatch {
                field: self.name.clone(),
                expected: self.field_type.to_string(),
                got: json_type_name(value).to_string(),
            })
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "Int",
        Value::Number(_) => "Float",
        Value::String(_) => "String",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    }
}

/// Getter for one named field of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldAccessor {
    /// The record identifier
    Id,
    /// A field value, addressed by pre-split dotted path
    Path(Vec<String>),
}

impl FieldAccessor {
    /// Build an accessor for `name`, given the collection's id field name.
    pub fn new(name: &str, id_field: &str) -> Self {
        if name == id_field {
            FieldAccessor::Id
        } else {
            FieldAccessor::Path(name.split('.').map(str::to_string).collect())
        }
    }

    /// Read the field from a record. Absent fields read as `null`.
    pub fn get<'a>(&self, record: &'a Record) -> Cow<'a, Value> {
        match self {
            FieldAccessor::Id => Cow::Owned(record.id.to_value()),
            FieldAccessor::Path(segments) => {
                match crate::value::resolve_path(&record.fields, segments) {
                    Some(v) => Cow::Borrowed(v),
                    None => Cow::Owned(Value::Null),
                }
            }
        }
    }
}

fn default_id_field() -> String {
    "id".to_string()
}

/// Serialized form of a collection schema, without the accessor table.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionSchemaRepr {
    name: CollectionName,
    #[serde(default = "default_id_field")]
    id_field: String,
    #[serde(default)]
    id_type: IdType,
    fields: Vec<FieldDef>,
}

impl From<CollectionSchemaRepr> for CollectionSchema {
    fn from(repr: CollectionSchemaRepr) -> Self {
        CollectionSchema::new(repr.name, repr.fields)
            .with_id(repr.id_field, repr.id_type)
    }
}

/// Schema for a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "CollectionSchemaRepr")]
pub struct CollectionSchema {
    /// Collection name
    pub name: CollectionName,
    /// Name of the identifier field
    pub id_field: String,
    /// Type of the identifier
    pub id_type: IdType,
    /// Field definitions
    pub fields: Vec<FieldDef>,
    #[serde(skip)]
    accessors: HashMap<String, FieldAccessor>,
}

impl PartialEq for CollectionSchema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.id_field == other.id_field
            && self.id_type == other.id_type
            && self.fields == other.fields
    }
}

impl CollectionSchema {
    /// Create a new collection schema with an integer `id` field.
    pub fn new(name: impl Into<CollectionName>, fields: Vec<FieldDef>) -> Self {
        let mut schema = Self {
            name: name.into(),
            id_field: default_id_field(),
            id_type: IdType::Int,
            fields,
            accessors: HashMap::new(),
        };
        schema.build_accessors();
        schema
    }

    /// Use a different identifier field name or type.
    pub fn with_id(mut self, id_field: impl Into<String>, id_type: IdType) -> Self {
        self.id_field = id_field.into();
        self.id_type = id_type;
        self.build_accessors();
        self
    }

    fn build_accessors(&mut self) {
        let mut accessors = HashMap::with_capacity(self.fields.len() + 1);
        accessors.insert(self.id_field.clone(), FieldAccessor::Id);
        for field in &self.fields {
            accessors.insert(
                field.name.clone(),
                FieldAccessor::new(&field.name, &self.id_field),
            );
        }
        self.accessors = accessors;
    }

    /// Accessor for a field name. Names outside the schema (computed
    /// pipeline fields, for example) get a path accessor.
    pub fn accessor(&self, name: &str) -> Cow<'_, FieldAccessor> {
        match self.accessors.get(name) {
            Some(accessor) => Cow::Borrowed(accessor),
            None => Cow::Owned(FieldAccessor::new(name, &self.id_field)),
        }
    }

    /// Get a field definition by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether `name` is the id or a plain (non-association) field.
    pub fn has_field(&self, name: &str) -> bool {
        name == self.id_field || self.field(name).is_some_and(|f| !f.is_association())
    }

    /// Whether `name` is an association field.
    pub fn has_association(&self, name: &str) -> bool {
        self.field(name).is_some_and(FieldDef::is_association)
    }

    /// Whether `name` may be used as a sort key at the schema level.
    pub fn is_sortable(&self, name: &str) -> bool {
        name == self.id_field || self.field(name).is_some_and(|f| f.sortable)
    }

    /// Validate a payload against this schema.
    pub fn validate_payload(&self, payload: &Value) -> Result<()> {
        let obj = payload
            .as_object()
            .ok_or_else(|| Error::InvalidPayload("payload must be an object".into()))?;

        for field in &self.fields {
            field.validate(obj.get(&field.name))?;
        }

        Ok(())
    }
}

/// Serialized form of a schema, before associations are linked.
#[derive(Deserialize)]
struct SchemaRepr {
    version: SchemaVersion,
    collections: HashMap<CollectionName, CollectionSchema>,
}

impl From<SchemaRepr> for Schema {
    fn from(repr: SchemaRepr) -> Self {
        let mut schema = Schema {
            version: repr.version,
            collections: repr.collections,
        };
        schema.link_references();
        schema
    }
}

/// Schema for all collections of a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "SchemaRepr")]
pub struct Schema {
    /// Schema version
    pub version: SchemaVersion,
    /// Collection schemas by name
    pub collections: HashMap<CollectionName, CollectionSchema>,
}

impl Schema {
    /// Create a new schema.
    pub fn new(version: SchemaVersion) -> Self {
        Self {
            version,
            collections: HashMap::new(),
        }
    }

    /// Add a collection to the schema.
    pub fn add_collection(&mut self, collection: CollectionSchema) -> &mut Self {
        self.collections.insert(collection.name.clone(), collection);
        self.link_references();
        self
    }

    /// Record each association's target id type, so filter tokens parse
    /// as the id the target actually uses.
    fn link_references(&mut self) {
        let id_types: HashMap<CollectionName, IdType> = self
            .collections
            .iter()
            .map(|(name, c)| (name.clone(), c.id_type))
            .collect();
        for collection in self.collections.values_mut() {
            for field in &mut collection.fields {
                if let Some(target) = &field.references {
                    field.target_id_type = id_types.get(target).copied();
                }
            }
        }
    }

    /// Builder-style method to add a collection.
    pub fn with_collection(mut self, collection: CollectionSchema) -> Self {
        self.add_collection(collection);
        self
    }

    /// Get a collection schema by name.
    pub fn get_collection(&self, name: &str) -> Option<&CollectionSchema> {
        self.collections.get(name)
    }

    /// Get a collection schema by name, or fail.
    pub fn collection(&self, name: &str) -> Result<&CollectionSchema> {
        self.get_collection(name)
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))
    }
}
