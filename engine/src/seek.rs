//! Seek predicate construction.

use crate::{CollectionSchema, CursorMode, Filter, Record, SortDirection, SortSpec};

/// Build the predicate selecting records strictly after `anchor` in the
/// effective sort order:
///
/// ```text
/// (order_by == anchor.order_by AND id cmp anchor.id) OR (order_by cmp anchor.order_by)
/// ```
///
/// where `cmp` is `>` for ascending and `<` for descending. `spec` must
/// already be direction-adjusted for the cursor mode. Returns `None` for
/// the first page.
pub fn seek_predicate(
    schema: &CollectionSchema,
    spec: &SortSpec,
    mode: CursorMode,
    anchor: Option<&Record>,
) -> Option<Filter> {
    if mode == CursorMode::None {
        return None;
    }
    let anchor = anchor?;

    let order_value = schema.accessor(&spec.order_by).get(anchor).into_owned();
    let id_value = anchor.id.to_value();
    let id_field = schema.id_field.clone();

    let cmp = |field: String, value| match spec.direction {
        SortDirection::Ascending => Filter::Gt(field, value),
        SortDirection::Descending => Filter::Lt(field, value),
    };

    Some(Filter::Or(vec![
        Filter::And(vec![
            Filter::Eq(spec.order_by.clone(), order_value.clone()),
            cmp(id_field, id_value),
        ]),
        cmp(spec.order_by.clone(), order_value),
    ]))
}
