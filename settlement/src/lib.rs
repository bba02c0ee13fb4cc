//! Household Settlement
//!
//! Shared-expense tracking and debt simplification for a small household.
//!
//! # Flow
//!
//! 1. **Record**: expenses are validated against the member roster and stored
//! 2. **Aggregate**: unsettled expenses are folded into per-member net balances
//! 3. **Net**: the netting engine turns nets into a short list of transfers
//! 4. **Cache**: the transfer list is stored as the household's balances
//!
//! Settling an expense removes it from step 2; the next recalculation no
//! longer sees it.
//!
//! # Netting Algorithm
//!
//! Greedy largest-creditor with largest-debtor matching over integer cents.
//! Deterministic for a given input order, at most `n - 1` transfers for `n`
//! non-zero members, never a transfer from a member to themselves.
//!
//! # Example
//!
//! ```
//! use rust_decimal::Decimal;
//! use settlement::{calculate_settlements, Currency, NetBalance};
//!
//! let nets = vec![
//!     NetBalance::new("alice", Decimal::new(5000, 2)),
//!     NetBalance::new("bob", Decimal::new(-5000, 2)),
//! ];
//!
//! let transfers = calculate_settlements(&nets, &Currency::usd())?;
//! assert_eq!(transfers.len(), 1);
//! assert_eq!(transfers[0].from_member_id.as_str(), "bob");
//! # Ok::<(), settlement::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod balances;
pub mod config;
pub mod error;
pub mod expenses;
pub mod netting;
pub mod roster;
pub mod split;
pub mod types;
pub mod validation;

// Re-exports
pub use balances::{calculate_balances, net_balances, BalanceAggregator};
pub use config::{Config, NettingConfig, RosterConfig};
pub use error::{Error, Result};
pub use expenses::{ExpenseBook, ExpenseChange, ExpenseDraft, ExpenseFilter, ExpensePatch};
pub use netting::{calculate_settlements, NettingEngine};
pub use roster::{MemberPatch, MemberRoster};
pub use types::*;
