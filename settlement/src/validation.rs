//! Input validation for members and expenses
//!
//! Every check runs before any state is touched; a failing check never
//! leaves a partially applied change behind.

use crate::{types::*, Error, Result};
use rust_decimal::Decimal;
use std::collections::HashSet;

/// Max description length
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// Max category length
pub const MAX_CATEGORY_LEN: usize = 30;

/// Max notes length
pub const MAX_NOTES_LEN: usize = 500;

/// Max member name length
pub const MAX_MEMBER_NAME_LEN: usize = 50;

/// Participant sums must match the expense amount closer than this
pub fn sum_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

/// Largest accepted amount for an expense or share
pub fn max_amount() -> Decimal {
    Decimal::from(10_000_000)
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Amount is positive with cent precision
pub fn validate_amount(field: &'static str, amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::validation(field, format!("{} must be positive", amount)));
    }
    if amount > max_amount() {
        return Err(Error::validation(
            field,
            format!("{} exceeds the maximum of {}", amount, max_amount()),
        ));
    }
    if !has_cent_precision(amount) {
        return Err(Error::validation(
            field,
            format!("{} has more than two decimal places", amount),
        ));
    }
    Ok(())
}

/// Participants are non-empty, distinct, positive, and sum to `amount`
pub fn validate_participants(amount: Decimal, participants: &[Participant]) -> Result<()> {
    if participants.is_empty() {
        return Err(Error::validation("participants", "at least one participant is required"));
    }

    let mut seen = HashSet::with_capacity(participants.len());
    for participant in participants {
        validate_amount("participants.amount", participant.amount)?;

        if let Some(percentage) = participant.percentage {
            if percentage < Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
                return Err(Error::validation(
                    "participants.percentage",
                    format!("{} is outside [0, 100]", percentage),
                ));
            }
        }

        if !seen.insert(&participant.member_id) {
            return Err(Error::validation(
                "participants",
                format!("{} is listed more than once", participant.member_id),
            ));
        }
    }

    let sum: Decimal = participants.iter().map(|p| p.amount).sum();
    if (sum - amount).abs() >= sum_tolerance() {
        return Err(Error::ParticipantSumMismatch { amount, sum });
    }

    Ok(())
}

/// Member name, color and share ratio
pub fn validate_member_fields(name: &str, color: &str, share_ratio: Decimal) -> Result<()> {
    let name_len = char_len(name.trim());
    if name_len == 0 || name_len > MAX_MEMBER_NAME_LEN {
        return Err(Error::validation(
            "name",
            format!("must be 1-{} characters", MAX_MEMBER_NAME_LEN),
        ));
    }

    let hex = color.strip_prefix('#').unwrap_or("");
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::validation("color", "must be a hex color (#RRGGBB)"));
    }

    if share_ratio < Decimal::ZERO || share_ratio > Decimal::ONE {
        return Err(Error::validation("shareRatio", format!("{} is outside [0, 1]", share_ratio)));
    }

    Ok(())
}

/// Full expense check against the member roster
///
/// Field rules first, then domain rules: participant sum, payer among
/// participants, payer and participants active.
pub fn validate_expense(expense: &Expense, members: &[Member]) -> Result<()> {
    let description_len = char_len(&expense.description);
    if description_len == 0 || description_len > MAX_DESCRIPTION_LEN {
        return Err(Error::validation(
            "description",
            format!("must be 1-{} characters", MAX_DESCRIPTION_LEN),
        ));
    }

    validate_amount("amount", expense.amount)?;

    if !expense.currency.is_valid() {
        return Err(Error::validation(
            "currency",
            format!("{} is not an ISO 4217 code", expense.currency),
        ));
    }

    if char_len(&expense.category) > MAX_CATEGORY_LEN {
        return Err(Error::validation(
            "category",
            format!("must be at most {} characters", MAX_CATEGORY_LEN),
        ));
    }

    if let Some(notes) = &expense.notes {
        if char_len(notes) > MAX_NOTES_LEN {
            return Err(Error::validation(
                "notes",
                format!("must be at most {} characters", MAX_NOTES_LEN),
            ));
        }
    }

    validate_participants(expense.amount, &expense.participants)?;

    if !expense
        .participants
        .iter()
        .any(|p| p.member_id == expense.payer_id)
    {
        return Err(Error::PayerNotParticipant(expense.payer_id.clone()));
    }

    let is_active = |id: &MemberId| members.iter().any(|m| &m.id == id && m.is_active);

    if !is_active(&expense.payer_id) {
        return Err(Error::InactiveMember(expense.payer_id.clone()));
    }
    if let Some(p) = expense.participants.iter().find(|p| !is_active(&p.member_id)) {
        return Err(Error::InactiveMember(p.member_id.clone()));
    }

    Ok(())
}
