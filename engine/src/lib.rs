//! # Folio Engine
//!
//! Keyset (cursor) pagination over sorted, filterable record collections.
//!
//! Pages are addressed by the identifier of a record on their edge instead
//! of a numeric offset, so they stay stable while the set changes
//! elsewhere. The identifier is appended to every sort as a tie-break,
//! which makes the order total even when the sort field has duplicates.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine talks to storage only through [`QueryExecutor`]
//! - **Stateless**: every page request is evaluated from scratch
//! - **One algorithm**: row stores and aggregation pipelines share it
//!
//! ## Core Concepts
//!
//! ### Sort negotiation
//!
//! [`SortSpec::negotiate`] validates the requested field against the
//! schema and a [`SortPolicy`]. A bad sort request silently falls back to
//! the identifier; it never fails the page.
//!
//! ### Cursors
//!
//! A [`CursorRequest`] is `None`, `After` (`starting_after`) or `Before`
//! (`ending_before`). The anchor record is looked up by exact id; an
//! unresolvable cursor is [`Error::AnchorNotFound`].
//!
//! ### Seeking
//!
//! [`seek_predicate`] builds
//! `(order_by == a.order_by AND id cmp a.id) OR (order_by cmp a.order_by)`.
//! `ending_before` seeks in the inverted order and the batch is reversed
//! before it is returned.
//!
//! ### Boundaries
//!
//! The first and last records of the filtered set ([`BoundaryPair`]) are
//! fetched alongside the total, so `has_next`/`has_prev` need no extra
//! row.
//!
//! ## Quick Start
//!
//! ```rust
//! use folio_engine::{
//!     CollectionSchema, FieldDef, FieldType, MemoryStore, PageRequest, Paginator,
//!     PaginatorConfig, QueryParams, Record, Schema, SortPolicy,
//! };
//! use futures::executor::block_on;
//! use serde_json::json;
//!
//! // 1. Define a schema
//! let mut schema = Schema::new(1);
//! schema.add_collection(CollectionSchema::new(
//!     "users",
//!     vec![FieldDef::required("name", FieldType::String)],
//! ));
//!
//! // 2. Fill a store
//! let mut store = MemoryStore::new(schema);
//! for id in 1..=10 {
//!     store
//!         .insert(Record::new(id, "users", json!({"name": format!("user {id}")})))
//!         .unwrap();
//! }
//!
//! // 3. Bind a query string
//! let users = store.schema().collection("users").unwrap();
//! let config = PaginatorConfig::default();
//! let request = PageRequest::from_params(
//!     users,
//!     &config,
//!     QueryParams::parse("limit=3"),
//!     SortPolicy::default(),
//!     "/users",
//! )
//! .unwrap();
//!
//! // 4. Serve the page
//! let page = block_on(Paginator::new(config).paginate(&store, users, &request)).unwrap();
//! assert_eq!(page.data.len(), 3);
//! assert!(page.has_next);
//! assert_eq!(page.next_url.as_deref(), Some("/users?limit=3&starting_after=3"));
//! ```
//!
//! ## Backends
//!
//! [`MemoryStore`] answers queries directly. [`PipelineExecutor`] runs an
//! aggregation [`Pipeline`] first and paginates its output, with a
//! single-pass boundary summary.
//!
//! ## Persistence
//!
//! Use [`MemoryStore::export_state`] and [`MemoryStore::import_state`] with
//! [`StoreSnapshot`] to load fixtures. Snapshots serialize to JSON with
//! deterministic ordering.

pub mod boundary;
pub mod config;
pub mod cursor;
pub mod error;
pub mod executor;
pub mod filter;
pub mod link;
pub mod page;
pub mod paginator;
pub mod params;
pub mod pipeline;
pub mod record;
pub mod schema;
pub mod seek;
pub mod snapshot;
pub mod sort;
pub mod store;
pub mod value;

// Re-export main types at crate root
pub use boundary::{BoundaryPair, Summary};
pub use config::{PaginationOptions, PaginatorConfig, SortOptions};
pub use cursor::{resolve_anchor, CursorMode, CursorRequest};
pub use error::{Error, Result, StoreError};
pub use executor::QueryExecutor;
pub use filter::{build_filter, compare_records, reverse_sort, Filter, SoftDelete, SortKey};
pub use link::LinkBuilder;
pub use page::{PageRequest, PageResult};
pub use paginator::Paginator;
pub use params::{ParamValue, QueryParams};
pub use pipeline::{Pipeline, PipelineExecutor, Stage};
pub use record::{IdType, Record, RecordId};
pub use schema::{CollectionSchema, FieldAccessor, FieldDef, FieldType, Schema};
pub use seek::seek_predicate;
pub use snapshot::{StoreSnapshot, SNAPSHOT_FORMAT_VERSION};
pub use sort::{SortDirection, SortPolicy, SortSpec};
pub use store::{Collection, MemoryStore, QueryBuilder};

/// Type aliases for clarity
pub type CollectionName = String;
pub type SchemaVersion = u32;
