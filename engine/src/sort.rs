//! Sort negotiation.
//!
//! A sort request never fails a page request: an unknown, empty or
//! forbidden `order_by` silently falls back to the identifier field, and
//! any direction token outside the configured descending aliases means
//! ascending.

use crate::{CollectionSchema, CursorMode, SortKey};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// The opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    /// Resolve a direction token against the descending aliases.
    pub fn from_token(token: Option<&str>, descending_values: &[String]) -> Self {
        match token {
            Some(t) if descending_values.iter().any(|d| d == t) => SortDirection::Descending,
            _ => SortDirection::Ascending,
        }
    }
}

/// Which fields a caller may sort by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortPolicy {
    /// Any sortable schema field except these.
    Forbidden(HashSet<String>),
    /// Exactly these fields, whether or not the schema declares them.
    /// Used for aggregation pipelines whose output has computed fields.
    Allowed(HashSet<String>),
}

impl Default for SortPolicy {
    fn default() -> Self {
        SortPolicy::Forbidden(HashSet::new())
    }
}

impl SortPolicy {
    /// Forbid sorting by the given fields.
    pub fn forbid<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SortPolicy::Forbidden(fields.into_iter().map(Into::into).collect())
    }

    /// Only allow sorting by the given fields.
    pub fn allow<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SortPolicy::Allowed(fields.into_iter().map(Into::into).collect())
    }

    /// Whether `field` is acceptable as the sort field.
    pub fn accepts(&self, schema: &CollectionSchema, field: &str) -> bool {
        if field.is_empty() {
            return false;
        }
        match self {
            SortPolicy::Forbidden(forbidden) => {
                schema.is_sortable(field) && !forbidden.contains(field)
            }
            SortPolicy::Allowed(allowed) => allowed.contains(field),
        }
    }
}

/// A validated sort: one field plus direction. The identifier is always
/// appended as tie-break when it is turned into sort keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub order_by: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(order_by: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            order_by: order_by.into(),
            direction,
        }
    }

    /// Sort by the collection's identifier.
    pub fn by_id(schema: &CollectionSchema, direction: SortDirection) -> Self {
        Self::new(schema.id_field.clone(), direction)
    }

    /// Validate a requested sort against the schema and policy.
    pub fn negotiate(
        schema: &CollectionSchema,
        order_by: Option<&str>,
        order: Option<&str>,
        policy: &SortPolicy,
        descending_values: &[String],
    ) -> Self {
        let direction = SortDirection::from_token(order, descending_values);
        match order_by {
            Some(field) if policy.accepts(schema, field) => Self::new(field, direction),
            requested => {
                if let Some(field) = requested {
                    tracing::debug!(
                        field,
                        collection = %schema.name,
                        "sort field rejected, falling back to id"
                    );
                }
                Self::by_id(schema, direction)
            }
        }
    }

    /// The direction the store must be queried in for a cursor mode.
    /// `ending_before` walks backwards, so it seeks in the inverted order.
    pub fn effective(&self, mode: CursorMode) -> Self {
        match mode {
            CursorMode::Before => Self::new(self.order_by.clone(), self.direction.reversed()),
            CursorMode::None | CursorMode::After => self.clone(),
        }
    }

    /// Same field, opposite direction.
    pub fn reversed(&self) -> Self {
        Self::new(self.order_by.clone(), self.direction.reversed())
    }

    /// Sort keys with the identifier tie-break.
    pub fn keys(&self, id_field: &str) -> Vec<SortKey> {
        let mut keys = Vec::with_capacity(2);
        if self.order_by != id_field {
            keys.push(SortKey::new(self.order_by.clone(), self.direction));
        }
        keys.push(SortKey::new(id_field, self.direction));
        keys
    }
}
