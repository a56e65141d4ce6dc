//! Database module for PostgreSQL persistence.

mod pool;
mod records;
mod sql;

pub use pool::*;
pub use records::*;
