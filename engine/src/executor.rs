//! The store seam.
//!
//! Every backend exposes the same small capability set: id lookup, count,
//! and a filtered, sorted, limited fetch. Boundary detection has default
//! implementations in terms of those, which backends may replace with a
//! cheaper single round trip.

use crate::{
    error::Result, filter::reverse_sort, BoundaryPair, CollectionSchema, Filter, Record,
    RecordId, SortKey, Summary,
};
use std::future::Future;

/// Query capabilities the paginator needs from a store.
///
/// Calls are independent and never retried; a failure is returned as
/// [`Error::Store`](crate::Error::Store) and ends the page request.
pub trait QueryExecutor: Sync {
    /// Exact identifier lookup, ignoring any filter.
    fn find_by_id(
        &self,
        schema: &CollectionSchema,
        id: &RecordId,
    ) -> impl Future<Output = Result<Option<Record>>> + Send;

    /// Number of records matching `filter`.
    fn count(
        &self,
        schema: &CollectionSchema,
        filter: &Filter,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Records matching `filter`, ordered by `sort`, at most `limit` of them.
    fn fetch(
        &self,
        schema: &CollectionSchema,
        filter: &Filter,
        sort: &[SortKey],
        limit: Option<u64>,
    ) -> impl Future<Output = Result<Vec<Record>>> + Send;

    /// First and last records of the filtered set under `sort`.
    ///
    /// Two one-row queries, the second in reversed order.
    fn extremes(
        &self,
        schema: &CollectionSchema,
        filter: &Filter,
        sort: &[SortKey],
    ) -> impl Future<Output = Result<BoundaryPair>> + Send {
        async move {
            let reversed = reverse_sort(sort);
            let (first, last) = futures::try_join!(
                self.fetch(schema, filter, sort, Some(1)),
                self.fetch(schema, filter, &reversed, Some(1)),
            )?;
            Ok(BoundaryPair::new(
                first.into_iter().next(),
                last.into_iter().next(),
            ))
        }
    }

    /// Total count and boundary of the filtered set.
    fn summarize(
        &self,
        schema: &CollectionSchema,
        filter: &Filter,
        sort: &[SortKey],
    ) -> impl Future<Output = Result<Summary>> + Send {
        async move {
            let (total, boundary) = futures::try_join!(
                self.count(schema, filter),
                self.extremes(schema, filter, sort),
            )?;
            Ok(Summary { total, boundary })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, FieldDef, FieldType, SortDirection};
    use futures::executor::block_on;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Executor over a fixed vector that counts fetches.
    struct Fixture {
        records: Vec<Record>,
        fetches: AtomicUsize,
        fail: bool,
    }

    impl Fixture {
        fn new(ids: &[i64]) -> Self {
            Self {
                records: ids
                    .iter()
                    .map(|id| Record::new(*id, "items", json!({"rank": id % 3})))
                    .collect(),
                fetches: AtomicUsize::new(0),
                fail: false,
            }
        }
    }

    impl QueryExecutor for Fixture {
        async fn find_by_id(
            &self,
            _schema: &CollectionSchema,
            id: &RecordId,
        ) -> Result<Option<Record>> {
            Ok(self.records.iter().find(|r| &r.id == id).cloned())
        }

        async fn count(&self, schema: &CollectionSchema, filter: &Filter) -> Result<u64> {
            Ok(self.records.iter().filter(|r| filter.matches(schema, r)).count() as u64)
        }

        async fn fetch(
            &self,
            schema: &CollectionSchema,
            filter: &Filter,
            sort: &[SortKey],
            limit: Option<u64>,
        ) -> Result<Vec<Record>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::store("backend unavailable"));
            }
            let mut out: Vec<Record> = self
                .records
                .iter()
                .filter(|r| filter.matches(schema, r))
                .cloned()
                .collect();
            out.sort_by(|a, b| crate::filter::compare_records(schema, sort, a, b));
            if let Some(limit) = limit {
                out.truncate(limit as usize);
            }
            Ok(out)
        }
    }

    fn schema() -> CollectionSchema {
        CollectionSchema::new("items", vec![FieldDef::optional("rank", FieldType::Int)])
    }

    #[test]
    fn default_extremes_uses_two_narrow_fetches() {
        let fixture = Fixture::new(&[5, 1, 9, 3]);
        let sort = vec![SortKey::new("id", SortDirection::Ascending)];

        let pair = block_on(fixture.extremes(&schema(), &Filter::all(), &sort)).unwrap();
        assert_eq!(pair.first.unwrap().id, RecordId::Int(1));
        assert_eq!(pair.last.unwrap().id, RecordId::Int(9));
        assert_eq!(fixture.fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn default_summarize() {
        let fixture = Fixture::new(&[1, 2, 3, 4, 5, 6]);
        let sort = vec![
            SortKey::new("rank", SortDirection::Descending),
            SortKey::new("id", SortDirection::Descending),
        ];
        let filter = Filter::Gt("id".into(), json!(1));

        let summary = block_on(fixture.summarize(&schema(), &filter, &sort)).unwrap();
        assert_eq!(summary.total, 5);
        // rank = id % 3: (2,2) and (5,2) lead, (3,0) and (6,0) trail.
        assert_eq!(summary.boundary.first.unwrap().id, RecordId::Int(5));
        assert_eq!(summary.boundary.last.unwrap().id, RecordId::Int(3));
    }

    #[test]
    fn empty_set_has_no_boundary() {
        let fixture = Fixture::new(&[]);
        let sort = vec![SortKey::new("id", SortDirection::Ascending)];
        let summary = block_on(fixture.summarize(&schema(), &Filter::all(), &sort)).unwrap();
        assert_eq!(summary.total, 0);
        assert!(summary.boundary.is_empty());
    }

    #[test]
    fn store_failures_propagate() {
        let mut fixture = Fixture::new(&[1]);
        fixture.fail = true;
        let sort = vec![SortKey::new("id", SortDirection::Ascending)];
        let result = block_on(fixture.extremes(&schema(), &Filter::all(), &sort));
        assert!(matches!(result, Err(Error::Store(_))));
    }
}
