//! Boundary detection.
//!
//! The first and last records of the whole filtered set tell whether a
//! page touches either edge without fetching one row more than asked for.

use crate::Record;
use serde::{Deserialize, Serialize};

/// First and last records of the filtered set in the caller's sort order.
///
/// Computed per request and never cached: the set may change between
/// requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryPair {
    pub first: Option<Record>,
    pub last: Option<Record>,
}

impl BoundaryPair {
    pub fn new(first: Option<Record>, last: Option<Record>) -> Self {
        Self { first, last }
    }

    /// Whether the filtered set was empty.
    pub fn is_empty(&self) -> bool {
        self.first.is_none() && self.last.is_none()
    }

    /// Compute `(has_next, has_prev)` for a page in caller-visible order.
    ///
    /// There is more after the page when its last record is not the set's
    /// last record, and more before it when its first record is not the
    /// set's first record. An empty page or set has neither.
    pub fn edges(&self, page: &[Record]) -> (bool, bool) {
        let (Some(page_first), Some(page_last)) = (page.first(), page.last()) else {
            return (false, false);
        };

        let has_next = self
            .last
            .as_ref()
            .is_some_and(|last| last.id != page_last.id);
        let has_prev = self
            .first
            .as_ref()
            .is_some_and(|first| first.id != page_first.id);

        (has_next, has_prev)
    }
}

/// Total count plus boundary of a filtered set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: u64,
    pub boundary: BoundaryPair,
}
