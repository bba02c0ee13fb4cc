//! Household PIN security
//!
//! Guards the household data behind a short numeric PIN.
//!
//! # Features
//!
//! ## PIN hashing (`pin`)
//! - PBKDF2-HMAC-SHA256, 100,000 iterations, 32-byte key
//! - 16-byte random salt per credential
//! - Constant-time comparison
//!
//! ## Rate limiting (`rate_limiter`)
//! - Consecutive failure counter persisted with the settings
//! - Lockout after 5 failures for 15 minutes
//! - Advisory progressive delay, capped at 16 seconds
//! - Manual "lock now"
//!
//! ## Authentication (`authenticator`)
//! - Setup, verify and change PIN over an explicit [`SettingsRepository`]
//! - Hashing runs on the blocking pool
//! - The PIN itself is never logged
//!
//! # Example
//!
//! ```rust,no_run
//! use security::{Config, PinAuthenticator, StoredSettings};
//! use std::sync::Arc;
//! use storage::MemoryStore;
//!
//! # async fn example() -> security::Result<()> {
//! let repository = Arc::new(StoredSettings::new(Arc::new(MemoryStore::new())));
//! let auth = PinAuthenticator::new(repository, Config::default());
//!
//! auth.setup_pin("2580", Some("the middle column".to_string())).await?;
//! if auth.verify("2580").await?.is_accepted() {
//!     // unlocked
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod authenticator;
pub mod config;
pub mod error;
pub mod pin;
pub mod rate_limiter;
pub mod settings;

// Re-exports for convenience
pub use authenticator::PinAuthenticator;
pub use config::{Config, RateLimiterConfig, SettingsDefaults};
pub use error::{Error, Result};
pub use pin::{hash_pin, validate_pin_format, verify_pin, PinHashRecord};
pub use rate_limiter::{LockStatus, RateLimiter, VerifyOutcome};
pub use settings::{Settings, SettingsRepository, StoredSettings};
