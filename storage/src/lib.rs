//! Household Storage
//!
//! Key-value persistence shared by the household crates.
//!
//! # Model
//!
//! Each key holds one JSON document (usually a whole collection). Mutations
//! follow the read-entire-collection, mutate-in-memory, write-entire-collection
//! pattern. Every stored value carries a version token so that a writer can
//! detect an interleaved write instead of silently overwriting it.
//!
//! # Backends
//!
//! - [`MemoryStore`]: process-local, used by tests and embedding callers
//! - [`JsonFileStore`]: single JSON document on disk, rewritten on every mutation
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use storage::{keys, Collection, MemoryStore};
//!
//! let store = Arc::new(MemoryStore::new());
//! let names: Collection<String> = Collection::new(store, keys::MEMBERS);
//!
//! names.update(|items| {
//!     items.push("alice".to_string());
//!     Ok::<_, storage::Error>(())
//! })?;
//! assert_eq!(names.load()?, vec!["alice".to_string()]);
//! # Ok::<(), storage::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod collection;
pub mod error;
pub mod file;
pub mod keys;
pub mod store;

// Re-exports
pub use collection::{Collection, Document};
pub use error::{Error, Result};
pub use file::JsonFileStore;
pub use store::{KeyValueStore, MemoryStore, Versioned};
