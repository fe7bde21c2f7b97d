//! Error types for the record store.

use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in a record store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record exists under the given key.
    #[error("record not found: {0}")]
    NotFound(String),

    /// The backend could not be opened.
    #[error("failed to open store: {0}")]
    FailedToOpen(String),

    /// The backend could not be closed cleanly.
    #[error("failed to close store: {0}")]
    FailedToClose(String),

    /// A read failed.
    #[error("failed to get record: {0}")]
    FailedToGet(String),

    /// A write failed.
    #[error("failed to put record: {0}")]
    FailedToPut(String),

    /// A field-scoped update failed.
    #[error("failed to update record: {0}")]
    FailedToUpdate(String),

    /// A stored document could not be mapped back to a record.
    #[error("corrupt record {cid}: {reason}")]
    Corrupt {
        /// Key of the offending document.
        cid: String,
        /// What failed to decode.
        reason: String,
    },
}
