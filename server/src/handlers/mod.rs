//! Request handlers for collection endpoints.

mod list;

pub use list::*;
