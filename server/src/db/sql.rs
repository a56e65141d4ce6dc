//! Translation of engine filters and sorts to PostgreSQL over JSONB.
//!
//! Fields are read with `payload #> path`; absent fields read as JSON
//! `null` so comparisons and ordering agree with the in-memory store.
//! Every value is a bound parameter.

use folio_engine::{CollectionSchema, FieldAccessor, Filter, SortDirection, SortKey};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};

/// Push the expression reading `field` of the current row.
pub fn push_field(qb: &mut QueryBuilder<'_, Postgres>, schema: &CollectionSchema, field: &str) {
    match schema.accessor(field).as_ref() {
        FieldAccessor::Id => {
            qb.push("id");
        }
        FieldAccessor::Path(segments) => {
            qb.push("COALESCE(payload #> ");
            qb.push_bind(segments.clone());
            qb.push(", 'null'::jsonb)");
        }
    }
}

fn push_comparison(
    qb: &mut QueryBuilder<'_, Postgres>,
    schema: &CollectionSchema,
    field: &str,
    op: &str,
    value: Value,
) {
    push_field(qb, schema, field);
    qb.push(op);
    qb.push_bind(Json(value));
}

fn push_junction(
    qb: &mut QueryBuilder<'_, Postgres>,
    schema: &CollectionSchema,
    filters: &[Filter],
    separator: &str,
    empty: &str,
) {
    if filters.is_empty() {
        qb.push(empty);
        return;
    }
    qb.push("(");
    for (i, filter) in filters.iter().enumerate() {
        if i > 0 {
            qb.push(separator);
        }
        push_filter(qb, schema, filter);
    }
    qb.push(")");
}

/// Push a boolean expression for `filter`.
pub fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, schema: &CollectionSchema, filter: &Filter) {
    match filter {
        Filter::Eq(field, value) => push_comparison(qb, schema, field, " = ", value.clone()),
        Filter::References(field, id) => push_comparison(qb, schema, field, " = ", id.to_value()),
        Filter::Gt(field, value) => push_comparison(qb, schema, field, " > ", value.clone()),
        Filter::Lt(field, value) => push_comparison(qb, schema, field, " < ", value.clone()),
        Filter::IsNull(field) => {
            push_field(qb, schema, field);
            qb.push(" = 'null'::jsonb");
        }
        Filter::And(filters) => push_junction(qb, schema, filters, " AND ", "TRUE"),
        Filter::Or(filters) => push_junction(qb, schema, filters, " OR ", "FALSE"),
    }
}

/// Push the comma-separated sort keys (without `ORDER BY`). An empty sort
/// orders by id.
pub fn push_sort(qb: &mut QueryBuilder<'_, Postgres>, schema: &CollectionSchema, sort: &[SortKey]) {
    if sort.is_empty() {
        qb.push("id ASC");
        return;
    }
    for (i, key) in sort.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        push_field(qb, schema, &key.field);
        qb.push(match key.direction {
            SortDirection::Ascending => " ASC",
            SortDirection::Descending => " DESC",
        });
    }
}
