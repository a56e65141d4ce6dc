//! Paginator configuration: which query keys mean what.

use serde::{Deserialize, Serialize};

/// Sort-related query keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortOptions {
    /// Key holding the direction token
    pub order_key: String,
    /// Key holding the sort field name
    pub order_by_key: String,
    /// Direction tokens meaning descending; anything else is ascending
    pub descending_values: Vec<String>,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            order_key: "order".to_string(),
            order_by_key: "order_by".to_string(),
            descending_values: ["-1", "desc", "DESC", "descendent", "DESCENDENT"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Pagination query keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationOptions {
    pub limit_key: String,
    /// List key carrying field filters: `filter[field]=value`
    pub filter_key: String,
    pub starting_after_key: String,
    pub ending_before_key: String,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            limit_key: "limit".to_string(),
            filter_key: "filter".to_string(),
            starting_after_key: "starting_after".to_string(),
            ending_before_key: "ending_before".to_string(),
        }
    }
}

/// Full paginator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginatorConfig {
    /// Field that is null on live records and set on soft-deleted ones
    pub soft_delete_key: String,
    pub sort: SortOptions,
    pub pagination: PaginationOptions,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            soft_delete_key: "deletedAt".to_string(),
            sort: SortOptions::default(),
            pagination: PaginationOptions::default(),
        }
    }
}
