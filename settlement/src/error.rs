//! Error types for expense splitting and settlement

use crate::types::MemberId;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Result type for settlement operations
pub type Result<T> = std::result::Result<T, Error>;

/// Settlement errors
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

    /// Participant amounts do not add up to the expense amount
    #[error("Participant amounts must sum to total expense amount ({sum} != {amount})")]
    ParticipantSumMismatch {
        /// Expense amount
        amount: Decimal,
        /// Sum of participant amounts
        sum: Decimal,
    },

    /// Payer missing from the participant list
    #[error("Payer {0} must be included in participants")]
    PayerNotParticipant(MemberId),

    /// Referenced member is unknown or inactive
    #[error("Invalid member ID: {0} or member is inactive")]
    InactiveMember(MemberId),

    /// Member not found
    #[error("Member not found: {0}")]
    MemberNotFound(MemberId),

    /// Another active member already uses this name
    #[error("Member name already in use: {0}")]
    DuplicateMemberName(String),

    /// Active member cap reached
    #[error("Household already has the maximum of {0} active members")]
    MemberLimitReached(usize),

    /// Expense not found
    #[error("Expense not found: {0}")]
    ExpenseNotFound(Uuid),

    /// Settled expenses are immutable
    #[error("Cannot edit settled expense {0}")]
    ExpenseSettled(Uuid),

    /// Expense was already settled
    #[error("Expense already settled: {0}")]
    AlreadySettled(Uuid),

    /// Only the creator may delete an expense
    #[error("Only creator can delete expense {expense_id} (requested by {member_id})")]
    NotCreator {
        /// Expense ID
        expense_id: Uuid,
        /// Member attempting the delete
        member_id: MemberId,
    },

    /// Net balances handed to the netting engine do not sum to zero
    #[error("Net balances do not conserve: residual {residual}")]
    ConservationViolated {
        /// Sum of all nets
        residual: Decimal,
    },

    /// Netting algorithm error
    #[error("Netting error: {0}")]
    Netting(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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
