//! Cursor resolution.
//!
//! Unlike sort negotiation, a cursor that does not resolve to a record is
//! an error: it means the caller followed a stale or broken link.

use crate::{error::Result, CollectionSchema, Error, QueryExecutor, Record, RecordId};
use serde::{Deserialize, Serialize};

/// Which way a page request walks from its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorMode {
    /// First page, starting at the beginning of the order
    #[default]
    None,
    /// Records strictly after the anchor (`starting_after`)
    After,
    /// Records strictly before the anchor (`ending_before`)
    Before,
}

/// Cursor part of a page request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorRequest {
    pub mode: CursorMode,
    /// Raw identifier token from the request
    pub anchor_id: Option<String>,
}

impl CursorRequest {
    /// No cursor: first page.
    pub fn none() -> Self {
        Self::default()
    }

    /// Page after the record with this id.
    pub fn after(id: impl ToString) -> Self {
        Self {
            mode: CursorMode::After,
            anchor_id: Some(id.to_string()),
        }
    }

    /// Page before the record with this id.
    pub fn before(id: impl ToString) -> Self {
        Self {
            mode: CursorMode::Before,
            anchor_id: Some(id.to_string()),
        }
    }

    /// Pick the cursor from the two request keys. `starting_after` wins
    /// when both are present.
    pub fn from_tokens(starting_after: Option<&str>, ending_before: Option<&str>) -> Self {
        match (starting_after, ending_before) {
            (Some(id), _) => Self::after(id),
            (None, Some(id)) => Self::before(id),
            (None, None) => Self::none(),
        }
    }
}

/// Look up the anchor record of a cursor.
///
/// The lookup matches the identifier only; the caller's filters are not
/// applied, so the anchor may lie outside the filtered set.
pub async fn resolve_anchor<E>(
    executor: &E,
    schema: &CollectionSchema,
    cursor: &CursorRequest,
) -> Result<Option<Record>>
where
    E: QueryExecutor + ?Sized,
{
    if cursor.mode == CursorMode::None {
        return Ok(None);
    }

    let raw = cursor.anchor_id.as_deref().unwrap_or_default();
    let id = RecordId::parse(schema.id_type, raw)
        .ok_or_else(|| Error::AnchorNotFound(raw.to_string()))?;

    match executor.find_by_id(schema, &id).await? {
        Some(record) => Ok(Some(record)),
        None => Err(Error::AnchorNotFound(raw.to_string())),
    }
}
