//! Error types for storage

use thiserror::Error;

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Storage errors
#[derive(Error, Debug)]
pub enum Error {
    /// Another writer changed the key since it was read
    #[error("Write conflict on {key}: expected version {expected:?}, found {actual:?}")]
    Conflict {
        /// Storage key
        key: String,
        /// Version the writer read
        expected: Option<u64>,
        /// Version currently stored
        actual: Option<u64>,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the error is a version conflict the caller may retry
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }
}
