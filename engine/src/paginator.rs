//! Paginator - one page request, start to finish.
//!
//! The flow is fixed per cursor mode:
//!
//! 1. Build the caller filter (soft-delete clause included).
//! 2. Concurrently: total count and boundary pair in the caller-visible
//!    order, and anchor resolution.
//! 3. Seek predicate against the anchor in the effective (possibly
//!    inverted) order, AND-ed onto the caller filter.
//! 4. One fetch of at most `limit` records.
//! 5. Reverse for `ending_before`, detect edges, build links.
//!
//! Nothing is cached between requests.

use crate::{
    cursor::resolve_anchor,
    error::Result,
    filter::{build_filter, SoftDelete},
    seek::seek_predicate,
    CollectionSchema, LinkBuilder, PageRequest, PageResult, PaginatorConfig, QueryExecutor,
    SortSpec,
};

/// Serves pages over any [`QueryExecutor`].
#[derive(Debug, Clone, Default)]
pub struct Paginator {
    config: PaginatorConfig,
}

impl Paginator {
    pub fn new(config: PaginatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PaginatorConfig {
        &self.config
    }

    /// Serve one page.
    ///
    /// Fails on an unknown filter field or an unresolvable cursor; store
    /// failures are returned unchanged.
    pub async fn paginate<E>(
        &self,
        executor: &E,
        schema: &CollectionSchema,
        request: &PageRequest,
    ) -> Result<PageResult>
    where
        E: QueryExecutor + ?Sized,
    {
        let soft_delete = if request.exclude_deleted {
            SoftDelete::Exclude(&self.config.soft_delete_key)
        } else {
            SoftDelete::Include
        };
        let filter = build_filter(schema, &request.filters, soft_delete)?;

        let sort = self.checked_sort(schema, request);
        let mode = request.cursor.mode;
        let effective = sort.effective(mode);

        tracing::debug!(
            collection = %schema.name,
            ?mode,
            order_by = %sort.order_by,
            direction = ?sort.direction,
            limit = ?request.limit,
            "paginating"
        );

        let visible_keys = sort.keys(&schema.id_field);
        let (summary, anchor) = futures::try_join!(
            executor.summarize(schema, &filter, &visible_keys),
            resolve_anchor(executor, schema, &request.cursor),
        )?;

        let windowed = match seek_predicate(schema, &effective, mode, anchor.as_ref()) {
            Some(predicate) => filter.and(predicate),
            None => filter,
        };
        let batch = executor
            .fetch(
                schema,
                &windowed,
                &effective.keys(&schema.id_field),
                request.limit,
            )
            .await?;

        let keys = &self.config.pagination;
        let links = LinkBuilder::new(
            &request.base_url,
            &request.params,
            &keys.starting_after_key,
            &keys.ending_before_key,
        );
        let page = PageResult::assemble(
            batch,
            mode,
            &summary.boundary,
            summary.total,
            request.limit.is_some(),
            &links,
        );

        tracing::debug!(
            collection = %schema.name,
            returned = page.data.len(),
            total = page.total,
            has_next = page.has_next,
            has_prev = page.has_prev,
            "page assembled"
        );
        Ok(page)
    }

    /// The request's sort, or the identifier if the policy rejects it.
    fn checked_sort(&self, schema: &CollectionSchema, request: &PageRequest) -> SortSpec {
        let sort = &request.sort;
        if sort.order_by == schema.id_field || request.sort_policy.accepts(schema, &sort.order_by)
        {
            sort.clone()
        } else {
            tracing::debug!(
                field = %sort.order_by,
                collection = %schema.name,
                "sort field rejected, falling back to id"
            );
            SortSpec::by_id(schema, sort.direction)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        CursorRequest, Error, FieldDef, FieldType, MemoryStore, QueryParams, Record, RecordId,
        Schema, SortDirection, SortPolicy,
    };
    use futures::executor::block_on;
    use serde_json::json;

    fn store() -> MemoryStore {
        let schema = Schema::new(1).with_collection(CollectionSchema::new(
            "items",
            vec![
                FieldDef::required("group", FieldType::Int),
                FieldDef::optional("secret", FieldType::String).unsortable(),
                FieldDef::optional("deletedAt", FieldType::Timestamp),
            ],
        ));
        let mut store = MemoryStore::new(schema);
        for id in 1..=10 {
            store
                .insert(Record::new(id, "items", json!({"group": id % 2})))
                .unwrap();
        }
        store
    }

    fn ids(page: &PageResult) -> Vec<i64> {
        page.data
            .iter()
            .map(|r| match r.id {
                RecordId::Int(id) => id,
                RecordId::Str(_) => panic!("string id"),
            })
            .collect()
    }

    fn run(store: &MemoryStore, request: PageRequest) -> Result<PageResult> {
        let schema = store.schema().collection("items").unwrap();
        block_on(Paginator::default().paginate(store, schema, &request))
    }

    fn request(store: &MemoryStore) -> PageRequest {
        PageRequest::new(store.schema().collection("items").unwrap())
    }

    #[test]
    fn unlimited_first_page_has_everything() {
        let store = store();
        let page = run(&store, request(&store)).unwrap();
        assert_eq!(ids(&page), (1..=10).collect::<Vec<_>>());
        assert_eq!(page.total, 10);
        assert!(!page.has_next && !page.has_prev);
        assert!(page.next_url.is_none());
    }

    #[test]
    fn ties_break_on_id_in_sort_direction() {
        let store = store();
        let sort = SortSpec::new("group", SortDirection::Descending);

        let page = run(&store, request(&store).with_sort(sort.clone()).with_limit(3)).unwrap();
        assert_eq!(ids(&page), vec![9, 7, 5]);

        let page = run(
            &store,
            request(&store)
                .with_sort(sort)
                .with_limit(3)
                .with_cursor(CursorRequest::after(5)),
        )
        .unwrap();
        assert_eq!(ids(&page), vec![3, 1, 10]);
        assert!(page.has_next && page.has_prev);
    }

    #[test]
    fn forbidden_sort_falls_back_to_id() {
        let store = store();
        let page = run(
            &store,
            request(&store)
                .with_sort(SortSpec::new("secret", SortDirection::Descending))
                .with_limit(2),
        )
        .unwrap();
        assert_eq!(ids(&page), vec![10, 9]);

        let page = run(
            &store,
            request(&store)
                .with_sort(SortSpec::new("group", SortDirection::Ascending))
                .with_sort_policy(SortPolicy::forbid(["group"]))
                .with_limit(2),
        )
        .unwrap();
        assert_eq!(ids(&page), vec![1, 2]);
    }

    #[test]
    fn soft_deleted_records_are_hidden() {
        let mut store = store();
        store
            .insert(Record::new(11, "items", json!({"group": 1, "deletedAt": 1700000000})))
            .unwrap();

        let page = run(&store, request(&store)).unwrap();
        assert_eq!(page.total, 10);

        let page = run(&store, request(&store).include_deleted()).unwrap();
        assert_eq!(page.total, 11);
    }

    #[test]
    fn anchor_outside_filter_still_seeks() {
        let store = store();
        // 4 is even, outside the group=1 filter, but still a valid anchor.
        let page = run(
            &store,
            request(&store)
                .with_filter("group", json!(1))
                .with_cursor(CursorRequest::after(4)),
        )
        .unwrap();
        assert_eq!(ids(&page), vec![5, 7, 9]);
        assert_eq!(page.total, 5);
        assert!(page.has_prev);
        assert!(!page.has_next);
    }

    #[test]
    fn errors_surface() {
        let store = store();
        let result = run(&store, request(&store).with_cursor(CursorRequest::before(42)));
        assert!(matches!(result, Err(Error::AnchorNotFound(id)) if id == "42"));

        let result = run(&store, request(&store).with_filter("colour", json!("red")));
        assert!(matches!(result, Err(Error::InvalidFilterField { .. })));
    }

    #[test]
    fn reference_filter_parses_target_id_type() {
        let schema = Schema::new(1)
            .with_collection(CollectionSchema::new(
                "tasks",
                vec![
                    FieldDef::required("title", FieldType::String),
                    FieldDef::reference("owner", "users"),
                ],
            ))
            .with_collection(
                CollectionSchema::new("users", vec![]).with_id("login", crate::IdType::String),
            );
        let mut store = MemoryStore::new(schema);
        store
            .insert(Record::new("7", "users", json!({})))
            .unwrap();
        store
            .insert(Record::new(1, "tasks", json!({"title": "a", "owner": "7"})))
            .unwrap();
        store
            .insert(Record::new(2, "tasks", json!({"title": "b", "owner": 7})))
            .unwrap();

        let tasks = store.schema().collection("tasks").unwrap();
        let config = PaginatorConfig::default();
        let req = PageRequest::from_params(
            tasks,
            &config,
            QueryParams::parse("filter[owner]=7"),
            SortPolicy::default(),
            "/tasks",
        )
        .unwrap();
        assert_eq!(req.filters, vec![("owner".to_string(), json!("7"))]);

        let page = block_on(Paginator::new(config).paginate(&store, tasks, &req)).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(ids(&page), vec![1]);
    }

    #[test]
    fn links_use_configured_keys() {
        let store = store();
        let mut config = PaginatorConfig::default();
        config.pagination.starting_after_key = "after".to_string();
        config.pagination.ending_before_key = "before".to_string();

        let schema = store.schema().collection("items").unwrap();
        let mut req = request(&store).with_limit(2).with_cursor(CursorRequest::after(4));
        req.base_url = "/items".to_string();
        req.params = QueryParams::parse("per=2&after=4");

        let page = block_on(Paginator::new(config).paginate(&store, schema, &req)).unwrap();
        assert_eq!(page.next_url.as_deref(), Some("/items?per=2&after=6"));
        assert_eq!(page.prev_url.as_deref(), Some("/items?per=2&before=5"));
    }
}
