//! Page requests and results.

use crate::{
    error::Result, value::coerce_param, BoundaryPair, CollectionSchema, CursorMode,
    CursorRequest, Error, FieldType, IdType, LinkBuilder, PaginatorConfig, QueryParams, Record,
    SortPolicy, SortSpec,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Everything needed to serve one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    /// Field -> value equality filters (associations match by id)
    pub filters: Vec<(String, Value)>,
    /// Maximum records per page; `None` returns the whole remainder
    pub limit: Option<u64>,
    /// Caller-visible sort, already negotiated
    pub sort: SortSpec,
    pub cursor: CursorRequest,
    /// Fields the caller may sort by; re-checked when the page is served
    pub sort_policy: SortPolicy,
    /// Hide records whose soft-delete field is set
    pub exclude_deleted: bool,
    /// Scheme, host and path that links are built on
    pub base_url: String,
    /// Original query parameters, reproduced in links
    pub params: QueryParams,
}

impl PageRequest {
    /// First page of a collection, sorted by id ascending, no limit.
    pub fn new(schema: &CollectionSchema) -> Self {
        Self {
            filters: Vec::new(),
            limit: None,
            sort: SortSpec::by_id(schema, Default::default()),
            cursor: CursorRequest::none(),
            sort_policy: SortPolicy::default(),
            exclude_deleted: true,
            base_url: String::new(),
            params: QueryParams::new(),
        }
    }

    /// Bind a parsed query string to a page request.
    ///
    /// Sort problems fall back silently; a bad limit, unknown filter field
    /// or mistyped filter value is an error.
    pub fn from_params(
        schema: &CollectionSchema,
        config: &PaginatorConfig,
        params: QueryParams,
        policy: SortPolicy,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let keys = &config.pagination;

        let limit = params
            .scalar(&keys.limit_key)
            .map(|raw| parse_limit(&raw))
            .transpose()?;

        let sort = SortSpec::negotiate(
            schema,
            params.scalar(&config.sort.order_by_key).as_deref(),
            params.scalar(&config.sort.order_key).as_deref(),
            &policy,
            &config.sort.descending_values,
        );

        let cursor = CursorRequest::from_tokens(
            params.scalar(&keys.starting_after_key).as_deref(),
            params.scalar(&keys.ending_before_key).as_deref(),
        );

        let filters = params
            .list(&keys.filter_key)
            .iter()
            .map(|(field, raw)| Ok((field.clone(), coerce_filter(schema, field, raw)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            filters,
            limit,
            sort,
            cursor,
            sort_policy: policy,
            exclude_deleted: true,
            base_url: base_url.into(),
            params,
        })
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_cursor(mut self, cursor: CursorRequest) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_sort_policy(mut self, policy: SortPolicy) -> Self {
        self.sort_policy = policy;
        self
    }

    pub fn include_deleted(mut self) -> Self {
        self.exclude_deleted = false;
        self
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: Value) -> Self {
        self.filters.push((field.into(), value));
        self
    }
}

fn parse_limit(raw: &str) -> Result<u64> {
    match raw.parse::<u64>() {
        Ok(limit) if limit > 0 => Ok(limit),
        _ => Err(Error::InvalidLimit(raw.to_string())),
    }
}

fn id_field_type(id_type: IdType) -> FieldType {
    match id_type {
        IdType::Int => FieldType::Int,
        IdType::String => FieldType::String,
    }
}

fn coerce_filter(schema: &CollectionSchema, field: &str, raw: &str) -> Result<Value> {
    if field == schema.id_field {
        return coerce_param(field, id_field_type(schema.id_type), raw);
    }
    let def = schema.field(field).ok_or_else(|| Error::InvalidFilterField {
        field: field.to_string(),
        collection: schema.name.clone(),
    })?;
    match def.target_id_type {
        Some(id_type) if def.is_association() => coerce_param(field, id_field_type(id_type), raw),
        _ => coerce_param(field, def.field_type, raw),
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// Records in the caller's requested order
    pub data: Vec<Record>,
    /// Size of the filtered set, independent of the cursor
    pub total: u64,
    pub has_next: bool,
    pub has_prev: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_url: Option<String>,
}

impl PageResult {
    /// Assemble a page from a fetched batch.
    ///
    /// `batch` is in fetch order: for `ending_before` that is the inverted
    /// order, and it is reversed here. Boundary flags compare the page
    /// edges against the boundary pair in caller order.
    pub fn assemble(
        mut batch: Vec<Record>,
        mode: CursorMode,
        boundary: &BoundaryPair,
        total: u64,
        has_limit: bool,
        links: &LinkBuilder<'_>,
    ) -> Self {
        if mode == CursorMode::Before {
            batch.reverse();
        }

        let (has_next, has_prev) = boundary.edges(&batch);
        let mut page = Self {
            data: Vec::new(),
            total,
            has_next,
            has_prev,
            next_url: None,
            prev_url: None,
        };

        if let (Some(first), Some(last)) = (batch.first(), batch.last()) {
            let (want_next, want_prev) = match mode {
                CursorMode::None => (has_limit, false),
                CursorMode::After => (has_limit && has_next, has_prev),
                CursorMode::Before => (has_next, has_limit && has_prev),
            };
            if want_next {
                page.next_url = Some(links.next(&last.id));
            }
            if want_prev {
                page.prev_url = Some(links.prev(&first.id));
            }
        }

        page.data = batch;
        page
    }
}
