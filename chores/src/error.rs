//! Error types for chore rotation

use settlement::MemberId;
use thiserror::Error;
use uuid::Uuid;

/// Result type for chore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Chore errors
#[derive(Error, Debug)]
pub enum Error {
    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] storage::Error),

    /// Malformed input, rejected before any state change
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// Rotation over an empty sequence
    #[error("Rotation sequence must include at least one member")]
    EmptySequence,

    /// Override target is not in the rotation
    #[error("Override member {0} is not part of the rotation sequence")]
    OverrideNotInSequence(MemberId),

    /// Every member of the sequence was skipped
    #[error("No eligible member found for rotation")]
    NoEligibleMember,

    /// Rotation index outside the sequence
    #[error("Invalid rotation index {index} for sequence of length {len}")]
    InvalidIndex {
        /// Requested index
        index: usize,
        /// Sequence length
        len: usize,
    },

    /// Chore not found
    #[error("Chore not found: {0}")]
    ChoreNotFound(Uuid),

    /// Assignment not found
    #[error("Assignment not found: {0}")]
    AssignmentNotFound(Uuid),

    /// Completed assignments can't be reassigned or completed again
    #[error("Assignment already completed: {0}")]
    AssignmentCompleted(Uuid),

    /// Only completed assignments can be disputed
    #[error("Assignment not completed yet: {0}")]
    AssignmentOpen(Uuid),
}

impl Error {
    /// Shorthand for a field validation error
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Error::Validation {
            field,
            message: message.into(),
        }
    }
}
