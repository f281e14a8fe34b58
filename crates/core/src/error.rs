//! Error types for the record store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or reading record collections.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A snapshot or lookup file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A snapshot file is not a JSON array of records of the expected shape.
    #[error("malformed collection snapshot {}: {source}", .path.display())]
    Malformed {
        /// File that failed.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// The backing store could not be reached.
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// A convenience result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
