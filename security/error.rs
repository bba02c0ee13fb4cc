//! Error types for PIN authentication

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type for security operations
pub type Result<T> = std::result::Result<T, Error>;

/// Security errors
#[derive(Error, Debug)]
pub enum Error {
    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] storage::Error),

    /// PIN is not 4-6 ASCII digits
    #[error("PIN must be 4-6 digits")]
    InvalidPinFormat,

    /// No credential record stored
    #[error("PIN not configured")]
    NotConfigured,

    /// Setup called with a PIN already in place
    #[error("PIN already configured, change it instead")]
    AlreadyConfigured,

    /// Current PIN did not verify during a change
    #[error("Current PIN is incorrect")]
    IncorrectPin,

    /// Operation refused while locked out
    #[error("Locked until {locked_until}")]
    Locked {
        /// Lock expiry
        locked_until: DateTime<Utc>,
    },

    /// Stored credential record can't be used
    #[error("Invalid credential record: {0}")]
    InvalidRecord(String),

    /// Malformed input, rejected before any state change
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// Blocking hash task failed
    #[error("Hashing task failed: {0}")]
    Task(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
