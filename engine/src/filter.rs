//! Filter and sort expressions understood by every store backend.
//!
//! Backends either evaluate these in memory ([`Filter::matches`],
//! [`compare_records`]) or translate them to their own query language.

use crate::{
    error::Result, value::compare_values, CollectionSchema, Error, Record, RecordId,
    SortDirection,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::cmp::Ordering;

/// A predicate over records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Filter {
    /// `field == value`
    Eq(String, Value),
    /// Association `field` points at the given record
    References(String, RecordId),
    /// `field > value`
    Gt(String, Value),
    /// `field < value`
    Lt(String, Value),
    /// `field` is absent or null
    IsNull(String),
    /// All sub-filters hold (vacuously true when empty)
    And(Vec<Filter>),
    /// At least one sub-filter holds
    Or(Vec<Filter>),
}

impl Filter {
    /// The filter matching every record.
    pub fn all() -> Self {
        Filter::And(Vec::new())
    }

    /// Whether this filter matches every record.
    pub fn is_all(&self) -> bool {
        matches!(self, Filter::And(filters) if filters.is_empty())
    }

    /// Conjunction of `self` and `other`, flattening nested `And`s.
    pub fn and(self, other: Filter) -> Filter {
        let mut filters = match self {
            Filter::And(filters) => filters,
            single => vec![single],
        };
        match other {
            Filter::And(more) => filters.extend(more),
            single => filters.push(single),
        }
        Filter::And(filters)
    }

    /// Evaluate against a record, resolving fields through the schema.
    pub fn matches(&self, schema: &CollectionSchema, record: &Record) -> bool {
        self.matches_by(&|field| schema.accessor(field).get(record))
    }

    /// Evaluate with a caller-supplied field reader.
    pub fn matches_by<'a, F>(&self, read: &F) -> bool
    where
        F: Fn(&str) -> Cow<'a, Value>,
    {
        let cmp = |field: &str, value: &Value| compare_values(&read(field), value);

        match self {
            Filter::Eq(field, value) => cmp(field, value) == Ordering::Equal,
            Filter::References(field, id) => {
                RecordId::from_value(&read(field)).as_ref() == Some(id)
            }
            Filter::Gt(field, value) => cmp(field, value) == Ordering::Greater,
            Filter::Lt(field, value) => cmp(field, value) == Ordering::Less,
            Filter::IsNull(field) => read(field).is_null(),
            Filter::And(filters) => filters.iter().all(|f| f.matches_by(read)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches_by(read)),
        }
    }
}

/// One key of a sort order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// The same key in the opposite direction.
    pub fn reversed(&self) -> Self {
        Self::new(self.field.clone(), self.direction.reversed())
    }
}

/// Reverse every key of a sort order.
pub fn reverse_sort(sort: &[SortKey]) -> Vec<SortKey> {
    sort.iter().map(SortKey::reversed).collect()
}

/// Compare two records under a multi-key sort.
pub fn compare_records(
    schema: &CollectionSchema,
    sort: &[SortKey],
    a: &Record,
    b: &Record,
) -> Ordering {
    for key in sort {
        let accessor = schema.accessor(&key.field);
        let ordering = compare_values(&accessor.get(a), &accessor.get(b));
        let ordering = match key.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Soft-delete exclusion for [`build_filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftDelete<'a> {
    /// Return soft-deleted records too
    Include,
    /// Only return records whose given field is null
    Exclude(&'a str),
}

/// Build the caller's filter from a field -> value mapping.
///
/// Plain fields match by equality, associations by reference. A name that
/// is neither fails the whole request.
pub fn build_filter(
    schema: &CollectionSchema,
    filters: &[(String, Value)],
    soft_delete: SoftDelete<'_>,
) -> Result<Filter> {
    let mut clauses = Vec::with_capacity(filters.len() + 1);

    for (field, value) in filters {
        if schema.has_field(field) {
            clauses.push(Filter::Eq(field.clone(), value.clone()));
        } else if schema.has_association(field) {
            let id = RecordId::from_value(value).ok_or_else(|| Error::TypeMismatch {
                field: field.clone(),
                expected: "Reference".to_string(),
                got: value.to_string(),
            })?;
            clauses.push(Filter::References(field.clone(), id));
        } else {
            return Err(Error::InvalidFilterField {
                field: field.clone(),
                collection: schema.name.clone(),
            });
        }
    }

    if let SoftDelete::Exclude(key) = soft_delete {
        clauses.push(Filter::IsNull(key.to_string()));
    }

    Ok(Filter::And(clauses))
}
