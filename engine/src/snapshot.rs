//! Snapshot types for persisting and restoring store contents.
//!
//! Snapshots are the bridge between the in-memory store and fixture files.
//! They serialize deterministically: collections and records are ordered.

use crate::{
    error::Result, store::Collection, CollectionName, Error, MemoryStore, Record, SchemaVersion,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version of the snapshot format for future compatibility.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// A point-in-time snapshot of store contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    /// Snapshot format version
    pub format_version: u32,
    /// Schema version at time of snapshot
    pub schema_version: SchemaVersion,
    /// Records per collection, in id order
    pub collections: BTreeMap<CollectionName, Vec<Record>>,
}

impl StoreSnapshot {
    /// Create a new empty snapshot.
    pub fn new(schema_version: SchemaVersion) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            schema_version,
            collections: BTreeMap::new(),
        }
    }

    /// Add a record to the snapshot.
    pub fn add_record(&mut self, record: Record) {
        self.collections
            .entry(record.collection.clone())
            .or_default()
            .push(record);
    }

    /// Count total records across all collections.
    pub fn record_count(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    /// Deserialize from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidSnapshot(e.to_string()))?;
        if snapshot.format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(Error::InvalidSnapshot(format!(
                "unsupported format version {}",
                snapshot.format_version
            )));
        }
        Ok(snapshot)
    }
}

impl MemoryStore {
    /// Export all records as a snapshot.
    pub fn export_state(&self) -> StoreSnapshot {
        let mut snapshot = StoreSnapshot::new(self.schema().version);
        let mut names: Vec<_> = self.schema().collections.keys().collect();
        names.sort();
        for name in names {
            if let Some(collection) = self.collection(name) {
                snapshot
                    .collections
                    .insert(name.clone(), collection.records().cloned().collect());
            }
        }
        snapshot
    }

    /// Replace store contents with a snapshot.
    ///
    /// Every record is validated against the schema; on any failure the
    /// store is left unchanged.
    pub fn import_state(&mut self, snapshot: StoreSnapshot) -> Result<()> {
        if snapshot.schema_version != self.schema().version {
            return Err(Error::InvalidSnapshot(format!(
                "schema version mismatch: expected {}, got {}",
                self.schema().version,
                snapshot.schema_version
            )));
        }

        let mut staged = MemoryStore::new(self.schema().clone());
        for (name, records) in snapshot.collections {
            for mut record in records {
                record.collection = name.clone();
                staged.insert(record)?;
            }
        }

        let collections: Vec<(CollectionName, Collection)> =
            staged.collections_mut().drain().collect();
        self.collections_mut().extend(collections);
        Ok(())
    }
}
