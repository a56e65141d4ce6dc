//! Aggregation-pipeline backend.
//!
//! A [`Pipeline`] reshapes a collection before pagination: it can narrow
//! it, join in records from other collections and project fields. The
//! paginator's sort and limit apply to the pipeline's output, so computed
//! fields (joined names, for instance) are sortable through
//! [`SortPolicy::Allowed`](crate::SortPolicy::Allowed).
//!
//! Filter clauses on fields the collection declares read the stored
//! record, so a projection that drops `deletedAt` or a filtered field
//! does not change which records match. Clauses on computed fields read
//! the pipeline's output.

use crate::{
    error::Result, filter::compare_records, value::resolve_path, BoundaryPair, CollectionName,
    CollectionSchema, Error, Filter, MemoryStore, QueryExecutor, Record, RecordId, SortKey,
    Summary,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// One pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    /// Keep records matching the filter
    Match(Filter),
    /// Replace `local_field`'s id with the referenced record, stored under
    /// `as_field` (null when the reference does not resolve)
    #[serde(rename_all = "camelCase")]
    Lookup {
        from: CollectionName,
        local_field: String,
        as_field: String,
    },
    /// Keep only these (possibly dotted) fields; the id is always kept
    Project(Vec<String>),
}

/// An ordered list of stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `Match` stage.
    pub fn matching(mut self, filter: Filter) -> Self {
        self.stages.push(Stage::Match(filter));
        self
    }

    /// Append a `Lookup` stage.
    pub fn lookup(
        mut self,
        from: impl Into<CollectionName>,
        local_field: impl Into<String>,
        as_field: impl Into<String>,
    ) -> Self {
        self.stages.push(Stage::Lookup {
            from: from.into(),
            local_field: local_field.into(),
            as_field: as_field.into(),
        });
        self
    }

    /// Append a `Project` stage.
    pub fn project<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stages
            .push(Stage::Project(fields.into_iter().map(Into::into).collect()));
        self
    }
}

/// Runs the paginator's queries over a pipeline's output.
#[derive(Debug, Clone)]
pub struct PipelineExecutor<'a> {
    store: &'a MemoryStore,
    pipeline: Pipeline,
}

impl<'a> PipelineExecutor<'a> {
    pub fn new(store: &'a MemoryStore, pipeline: Pipeline) -> Self {
        Self { store, pipeline }
    }

    /// Run the whole pipeline over a collection.
    pub fn run(&self, schema: &CollectionSchema) -> Result<Vec<Record>> {
        Ok(self
            .run_with_sources(schema)?
            .into_iter()
            .map(|(_, shaped)| shaped)
            .collect())
    }

    /// Pipeline output paired with the stored record it came from.
    fn run_with_sources<'s>(
        &'s self,
        schema: &CollectionSchema,
    ) -> Result<Vec<(&'s Record, Record)>> {
        let collection = self
            .store
            .collection(&schema.name)
            .ok_or_else(|| Error::CollectionNotFound(schema.name.clone()))?;

        let mut records: Vec<(&Record, Record)> =
            collection.records().map(|r| (r, r.clone())).collect();
        for stage in &self.pipeline.stages {
            match stage {
                Stage::Match(filter) => records.retain(|(_, r)| filter.matches(schema, r)),
                reshape => {
                    for (_, record) in &mut records {
                        self.reshape(reshape, record)?;
                    }
                }
            }
        }
        Ok(records)
    }

    /// Whether `field` is read from the stored record: the collection
    /// declares it and no lookup overwrites it.
    fn reads_source(&self, schema: &CollectionSchema, field: &str) -> bool {
        let declared = field == schema.id_field || schema.field(field).is_some();
        declared
            && !self.pipeline.stages.iter().any(
                |stage| matches!(stage, Stage::Lookup { as_field, .. } if as_field == field),
            )
    }

    fn matching(&self, schema: &CollectionSchema, filter: &Filter) -> Result<Vec<Record>> {
        let mut records = self.run_with_sources(schema)?;
        records.retain(|(source, shaped)| {
            filter.matches_by(&|field| {
                let record = if self.reads_source(schema, field) {
                    *source
                } else {
                    shaped
                };
                schema.accessor(field).get(record)
            })
        });
        Ok(records.into_iter().map(|(_, shaped)| shaped).collect())
    }

    fn reshape(&self, stage: &Stage, record: &mut Record) -> Result<()> {
        match stage {
            Stage::Match(_) => {}
            Stage::Lookup {
                from,
                local_field,
                as_field,
            } => {
                let joined = self.join(from, record.field(local_field))?;
                record.fields.insert(as_field.clone(), joined);
            }
            Stage::Project(fields) => {
                let mut projected = Map::new();
                for field in fields {
                    let path: Vec<String> = field.split('.').map(str::to_string).collect();
                    if let Some(value) = resolve_path(&record.fields, &path) {
                        insert_path(&mut projected, &path, value.clone());
                    }
                }
                record.fields = projected;
            }
        }
        Ok(())
    }

    fn join(&self, from: &str, local: Option<&Value>) -> Result<Value> {
        let target_schema = self.store.schema().collection(from)?;
        let Some(id) = local.and_then(RecordId::from_value) else {
            return Ok(Value::Null);
        };
        Ok(match self.store.get(from, &id) {
            Some(target) => {
                let mut object = target.fields.clone();
                object.insert(target_schema.id_field.clone(), target.id.to_value());
                Value::Object(object)
            }
            None => Value::Null,
        })
    }
}

fn insert_path(map: &mut Map<String, Value>, path: &[String], value: Value) {
    match path {
        [] => {}
        [last] => {
            map.insert(last.clone(), value);
        }
        [head, rest @ ..] => {
            let child = map
                .entry(head.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(inner) = child {
                insert_path(inner, rest, value);
            }
        }
    }
}

impl QueryExecutor for PipelineExecutor<'_> {
    /// Raw id lookup, then the reshaping stages so computed fields exist on
    /// the anchor. `Match` stages are skipped: the anchor may lie outside
    /// the pipeline's set.
    async fn find_by_id(&self, schema: &CollectionSchema, id: &RecordId) -> Result<Option<Record>> {
        let Some(record) = self.store.get(&schema.name, id) else {
            return Ok(None);
        };
        let mut record = record.clone();
        for stage in &self.pipeline.stages {
            self.reshape(stage, &mut record)?;
        }
        Ok(Some(record))
    }

    async fn count(&self, schema: &CollectionSchema, filter: &Filter) -> Result<u64> {
        Ok(self.matching(schema, filter)?.len() as u64)
    }

    async fn fetch(
        &self,
        schema: &CollectionSchema,
        filter: &Filter,
        sort: &[SortKey],
        limit: Option<u64>,
    ) -> Result<Vec<Record>> {
        let mut records = self.matching(schema, filter)?;
        records.sort_by(|a, b| compare_records(schema, sort, a, b));
        if let Some(limit) = limit {
            records.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(records)
    }

    /// One pass over the pipeline output, accumulating count, first and
    /// last.
    async fn summarize(
        &self,
        schema: &CollectionSchema,
        filter: &Filter,
        sort: &[SortKey],
    ) -> Result<Summary> {
        let mut total = 0;
        let mut first: Option<Record> = None;
        let mut last: Option<Record> = None;

        for record in self.matching(schema, filter)? {
            total += 1;
            if first
                .as_ref()
                .map_or(true, |f| compare_records(schema, sort, &record, f) == Ordering::Less)
            {
                first = Some(record.clone());
            }
            if last
                .as_ref()
                .map_or(true, |l| compare_records(schema, sort, &record, l) == Ordering::Greater)
            {
                last = Some(record);
            }
        }

        Ok(Summary {
            total,
            boundary: BoundaryPair::new(first, last),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldDef, FieldType, Schema, SortDirection};
    use futures::executor::block_on;
    use serde_json::json;

    fn store() -> MemoryStore {
        let schema = Schema::new(1)
            .with_collection(CollectionSchema::new(
                "authors",
                vec![FieldDef::required("name", FieldType::String)],
            ))
            .with_collection(CollectionSchema::new(
                "books",
                vec![
                    FieldDef::required("title", FieldType::String),
                    FieldDef::optional("pages", FieldType::Int),
                    FieldDef::reference("author", "authors"),
                ],
            ));
        let mut store = MemoryStore::new(schema);
        for (id, name) in [(1, "Le Guin"), (2, "Banks")] {
            store
                .insert(Record::new(id, "authors", json!({"name": name})))
                .unwrap();
        }
        for (id, title, pages, author) in [
            (10, "Dispossessed", 387, 1),
            (11, "Excession", 451, 2),
            (12, "Lathe of Heaven", 184, 1),
            (13, "Orphan", 90, 9),
        ] {
            store
                .insert(Record::new(
                    id,
                    "books",
                    json!({"title": title, "pages": pages, "author": author}),
                ))
                .unwrap();
        }
        store
    }

    fn joined() -> Pipeline {
        Pipeline::new()
            .lookup("authors", "author", "writer")
            .project(["title", "writer.name"])
    }

    #[test]
    fn lookup_and_project() {
        let store = store();
        let schema = store.schema().collection("books").unwrap();
        let records = PipelineExecutor::new(&store, joined()).run(schema).unwrap();

        assert_eq!(records[0].payload(), json!({"title": "Dispossessed", "writer": {"name": "Le Guin"}}));
        // Unresolved reference projects nothing for the writer.
        assert_eq!(records[3].payload(), json!({"title": "Orphan"}));
    }

    #[test]
    fn match_narrows_and_filter_applies_after() {
        let store = store();
        let schema = store.schema().collection("books").unwrap();
        let pipeline = Pipeline::new().matching(Filter::Gt("pages".into(), json!(100)));
        let executor = PipelineExecutor::new(&store, pipeline);

        assert_eq!(block_on(executor.count(schema, &Filter::all())).unwrap(), 3);
        let filter = Filter::References("author".into(), RecordId::Int(1));
        assert_eq!(block_on(executor.count(schema, &filter)).unwrap(), 2);
    }

    #[test]
    fn sorts_by_computed_field() {
        let store = store();
        let schema = store.schema().collection("books").unwrap();
        let executor = PipelineExecutor::new(&store, joined());
        let sort = vec![
            SortKey::new("writer.name", SortDirection::Ascending),
            SortKey::new("id", SortDirection::Ascending),
        ];

        let records = block_on(executor.fetch(schema, &Filter::all(), &sort, Some(3))).unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id.clone()).collect();
        // Missing writer sorts first as null.
        assert_eq!(ids, vec![13.into(), 11.into(), 10.into()]);
    }

    #[test]
    fn anchor_gets_computed_fields_outside_match() {
        let store = store();
        let schema = store.schema().collection("books").unwrap();
        let pipeline = joined().matching(Filter::Eq("title".into(), json!("Excession")));
        let executor = PipelineExecutor::new(&store, pipeline);

        let anchor = block_on(executor.find_by_id(schema, &RecordId::Int(10)))
            .unwrap()
            .unwrap();
        assert_eq!(anchor.field("writer.name"), Some(&json!("Le Guin")));
        assert!(block_on(executor.find_by_id(schema, &RecordId::Int(99)))
            .unwrap()
            .is_none());
    }

    #[test]
    fn single_pass_summary_matches_default_strategy() {
        let store = store();
        let schema = store.schema().collection("books").unwrap();
        let executor = PipelineExecutor::new(&store, joined());
        let sort = vec![
            SortKey::new("writer.name", SortDirection::Descending),
            SortKey::new("id", SortDirection::Descending),
        ];

        let summary = block_on(executor.summarize(schema, &Filter::all(), &sort)).unwrap();
        let pair = block_on(executor.extremes(schema, &Filter::all(), &sort)).unwrap();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.boundary, pair);
        assert_eq!(pair.first.unwrap().id, RecordId::Int(12));
        assert_eq!(pair.last.unwrap().id, RecordId::Int(13));
    }

    #[test]
    fn projection_does_not_hide_stored_fields_from_filters() {
        let schema = Schema::new(1).with_collection(CollectionSchema::new(
            "notes",
            vec![
                FieldDef::required("title", FieldType::String),
                FieldDef::optional("pinned", FieldType::Bool),
                FieldDef::optional("deletedAt", FieldType::Timestamp),
            ],
        ));
        let mut store = MemoryStore::new(schema);
        store
            .insert(Record::new(1, "notes", json!({"title": "kept", "pinned": true})))
            .unwrap();
        store
            .insert(Record::new(2, "notes", json!({"title": "gone", "deletedAt": 1700000000})))
            .unwrap();
        store
            .insert(Record::new(3, "notes", json!({"title": "plain"})))
            .unwrap();

        let notes = store.schema().collection("notes").unwrap();
        let executor = PipelineExecutor::new(&store, Pipeline::new().project(["title"]));
        let paginator = crate::Paginator::default();

        let page = block_on(paginator.paginate(&executor, notes, &crate::PageRequest::new(notes)))
            .unwrap();
        assert_eq!(page.total, 2);
        let ids: Vec<_> = page.data.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![RecordId::Int(1), RecordId::Int(3)]);
        assert_eq!(page.data[0].payload(), json!({"title": "kept"}));

        let pinned = crate::PageRequest::new(notes).with_filter("pinned", json!(true));
        let page = block_on(paginator.paginate(&executor, notes, &pinned)).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].id, RecordId::Int(1));
    }

    #[test]
    fn lookup_from_unknown_collection_fails() {
        let store = store();
        let schema = store.schema().collection("books").unwrap();
        let pipeline = Pipeline::new().lookup("publishers", "publisher", "publisher");
        let result = PipelineExecutor::new(&store, pipeline).run(schema);
        assert!(matches!(result, Err(Error::CollectionNotFound(name)) if name == "publishers"));
    }
}
