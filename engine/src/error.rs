//! Error types for the Folio engine.

use crate::CollectionName;
use thiserror::Error;

/// Boxed error produced by a store backend.
pub type StoreError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All possible errors from the Folio engine.
#[derive(Debug, Error)]
pub enum Error {
    // Request errors
    #[error("collection not found: {0}")]
    CollectionNotFound(CollectionName),

    #[error("invalid filter field '{field}' for collection {collection}")]
    InvalidFilterField {
        field: String,
        collection: CollectionName,
    },

    #[error("anchor record not found: {0}")]
    AnchorNotFound(String),

    #[error("invalid limit: {0}")]
    InvalidLimit(String),

    #[error("type mismatch for field '{field}': expected {expected}, got {got}")]
    TypeMismatch {
        field: String,
        expected: String,
        got: String,
    },

    // Record errors
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("missing required field: {0}")]
    MissingRequiredField(String),

    #[error("record already exists: {0}")]
    DuplicateRecord(String),

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    // Backend errors
    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

impl Error {
    /// Wrap a backend failure.
    pub fn store(err: impl Into<StoreError>) -> Self {
        Error::Store(err.into())
    }

    /// Whether the caller can fix the request to make this error go away.
    ///
    /// Store failures are server-side; everything the caller sent in the
    /// query string (filters, cursors, limits) is client-correctable.
    pub fn is_client_error(&self) -> bool {
        match self {
            Error::CollectionNotFound(_)
            | Error::InvalidFilterField { .. }
            | Error::AnchorNotFound(_)
            | Error::InvalidLimit(_)
            | Error::TypeMismatch { .. }
            | Error::InvalidPayload(_)
            | Error::MissingRequiredField(_)
            | Error::DuplicateRecord(_) => true,
            Error::InvalidSnapshot(_) | Error::Store(_) => false,
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
