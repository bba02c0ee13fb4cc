//! Rotation sequencer
//!
//! Circular pointer advance over a chore's rotation sequence. Pure: the
//! caller persists `next_index` and creates the next assignment.

use crate::{types::*, Error, Result};
use std::collections::HashSet;

/// Pick the next assignee
///
/// An override jumps to the target's position so later rotations continue
/// from there. Otherwise the scan starts one past `current_index`, wraps
/// around, and passes over skipped members.
pub fn get_next_assignee(
    request: &RotationRequest<'_>,
    options: &RotationOptions,
) -> Result<RotationResult> {
    let sequence = request.sequence;
    if sequence.is_empty() {
        return Err(Error::EmptySequence);
    }

    if let Some(target) = &options.override_member_id {
        let next_index = sequence
            .iter()
            .position(|m| m == target)
            .ok_or_else(|| Error::OverrideNotInSequence(target.clone()))?;

        return Ok(RotationResult {
            member_id: target.clone(),
            next_index,
        });
    }

    let skip: HashSet<_> = options.skip_members.iter().collect();
    let len = sequence.len();

    (1..=len)
        .map(|step| (request.current_index % len + step) % len)
        .find(|&i| !skip.contains(&sequence[i]))
        .map(|next_index| RotationResult {
            member_id: sequence[next_index].clone(),
            next_index,
        })
        .ok_or(Error::NoEligibleMember)
}
