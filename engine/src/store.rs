//! Store - the in-memory record container.
//!
//! The Store holds records per collection, validated against the schema on
//! insert, and answers queries through a [`QueryBuilder`]. It implements
//! [`QueryExecutor`] directly, so it can back the paginator as is.

use crate::{
    error::Result, filter::compare_records, CollectionName, CollectionSchema, Error, Filter,
    QueryExecutor, Record, RecordId, Schema, SortKey,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A collection of records, keyed by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collection {
    records: BTreeMap<RecordId, Record>,
}

impl Collection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    /// Get a record by ID.
    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.get(id)
    }

    /// Insert or replace a record.
    pub fn insert(&mut self, record: Record) {
        self.records.insert(record.id.clone(), record);
    }

    /// Remove a record.
    pub fn remove(&mut self, id: &RecordId) -> Option<Record> {
        self.records.remove(id)
    }

    /// Check if a record exists.
    pub fn contains(&self, id: &RecordId) -> bool {
        self.records.contains_key(id)
    }

    /// All records in id order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Count of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if collection has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The in-memory store.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    /// Schema for validation
    schema: Schema,
    /// Collections by name
    collections: HashMap<CollectionName, Collection>,
}

impl MemoryStore {
    /// Create an empty store with a collection per schema entry.
    pub fn new(schema: Schema) -> Self {
        let collections = schema
            .collections
            .keys()
            .map(|name| (name.clone(), Collection::new()))
            .collect();

        Self {
            schema,
            collections,
        }
    }

    /// Get the schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Insert a new record after validating it against its collection.
    pub fn insert(&mut self, record: Record) -> Result<()> {
        let collection_schema = self.schema.collection(&record.collection)?;
        collection_schema.validate_payload(&record.payload())?;

        let collection = self
            .collections
            .get_mut(&record.collection)
            .ok_or_else(|| Error::CollectionNotFound(record.collection.clone()))?;

        if collection.contains(&record.id) {
            return Err(Error::DuplicateRecord(record.id.to_string()));
        }
        collection.insert(record);
        Ok(())
    }

    /// Remove a record, returning it if it existed.
    pub fn remove(&mut self, collection: &str, id: &RecordId) -> Option<Record> {
        self.collections.get_mut(collection)?.remove(id)
    }

    /// Get a record by collection and ID.
    pub fn get(&self, collection: &str, id: &RecordId) -> Option<&Record> {
        self.collections.get(collection)?.get(id)
    }

    /// Get a collection by name.
    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    /// Query records in a collection.
    pub fn query(&self, collection: &str) -> Result<QueryBuilder<'_>> {
        let schema = self.schema.collection(collection)?;
        let records = self
            .collections
            .get(collection)
            .ok_or_else(|| Error::CollectionNotFound(collection.to_string()))?;
        Ok(QueryBuilder::new(schema, records))
    }

    pub(crate) fn collections_mut(&mut self) -> &mut HashMap<CollectionName, Collection> {
        &mut self.collections
    }
}

/// Builder for querying a collection.
#[derive(Debug)]
pub struct QueryBuilder<'a> {
    schema: &'a CollectionSchema,
    collection: &'a Collection,
    filter: Filter,
    sort: Vec<SortKey>,
    limit: Option<u64>,
}

impl<'a> QueryBuilder<'a> {
    fn new(schema: &'a CollectionSchema, collection: &'a Collection) -> Self {
        Self {
            schema,
            collection,
            filter: Filter::all(),
            sort: Vec::new(),
            limit: None,
        }
    }

    /// AND a filter into the query.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = self.filter.and(filter);
        self
    }

    /// Set the sort order. Without one, records come back in id order.
    pub fn sort(mut self, sort: &[SortKey]) -> Self {
        self.sort = sort.to_vec();
        self
    }

    /// Cap the number of records returned.
    pub fn limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    fn matching(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.collection
            .records()
            .filter(move |r| self.filter.matches(self.schema, r))
    }

    /// Execute the query.
    pub fn all(self) -> Vec<&'a Record> {
        let mut records: Vec<&'a Record> = self.matching().collect();
        if !self.sort.is_empty() {
            records.sort_by(|a, b| compare_records(self.schema, &self.sort, a, b));
        }
        if let Some(limit) = self.limit {
            records.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        records
    }

    /// Get the first matching record in sort order.
    pub fn first(self) -> Option<&'a Record> {
        self.limit(Some(1)).all().into_iter().next()
    }

    /// Count matching records, ignoring the limit.
    pub fn count(self) -> usize {
        self.matching().count()
    }
}

impl QueryExecutor for MemoryStore {
    async fn find_by_id(&self, schema: &CollectionSchema, id: &RecordId) -> Result<Option<Record>> {
        Ok(self.get(&schema.name, id).cloned())
    }

    async fn count(&self, schema: &CollectionSchema, filter: &Filter) -> Result<u64> {
        let count = self.query(&schema.name)?.filter(filter.clone()).count();
        Ok(count as u64)
    }

    async fn fetch(
        &self,
        schema: &CollectionSchema,
        filter: &Filter,
        sort: &[SortKey],
        limit: Option<u64>,
    ) -> Result<Vec<Record>> {
        let records = self
            .query(&schema.name)?
            .filter(filter.clone())
            .sort(sort)
            .limit(limit)
            .all();
        Ok(records.into_iter().cloned().collect())
    }
}
