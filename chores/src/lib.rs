//! Household Chores
//!
//! Recurring chores with a member rotation.
//!
//! Each chore keeps an ordered rotation sequence and a pointer into it. The
//! pointer moves forward, wrapping around, when an assignment is completed
//! or when the rotation is advanced by hand; skip and override options let
//! a single step pass over absent members or jump to a specific one.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, missing_debug_implementations)]

pub mod error;
pub mod rotation;
pub mod schedule;
pub mod types;

pub use error::{Error, Result};
pub use rotation::get_next_assignee;
pub use schedule::{ChoreBook, ChoreDraft, ChorePatch, Completion};
pub use types::*;
