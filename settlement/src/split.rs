//! Participant share calculation
//!
//! Turns an expense total and a set of members into participant amounts that
//! add up to the total exactly, cent for cent.

use crate::{types::*, Error, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Split `amount` evenly across `members`
///
/// Leftover cents go one each to the first members in the list.
pub fn equal_split(amount: Decimal, members: &[MemberId]) -> Result<Vec<Participant>> {
    let cents = split_total(amount, members.len())?;
    let count = members.len() as i64;
    let base = cents / count;
    let remainder = (cents % count) as usize;

    if base == 0 {
        return Err(Error::validation(
            "amount",
            format!("{} is too small to split among {} participants", amount, count),
        ));
    }

    Ok(members
        .iter()
        .enumerate()
        .map(|(i, member_id)| Participant {
            member_id: member_id.clone(),
            amount: from_cents(if i < remainder { base + 1 } else { base }),
            percentage: None,
        })
        .collect())
}

/// Split `amount` in proportion to each member's share ratio
///
/// Ratios are normalised; if they are all zero every member weighs the same.
/// The rounding residue is added to the largest share.
pub fn ratio_split(amount: Decimal, members: &[(MemberId, Decimal)]) -> Result<Vec<Participant>> {
    let cents = split_total(amount, members.len())?;

    if let Some((member_id, ratio)) = members
        .iter()
        .find(|(_, ratio)| *ratio < Decimal::ZERO || *ratio > Decimal::ONE)
    {
        return Err(Error::validation(
            "shareRatio",
            format!("{} for {} is outside [0, 1]", ratio, member_id),
        ));
    }

    let mut weights: Vec<Decimal> = members.iter().map(|(_, ratio)| *ratio).collect();
    if weights.iter().all(|w| w.is_zero()) {
        weights = vec![Decimal::ONE; members.len()];
    }
    let weight_sum: Decimal = weights.iter().sum();

    let total = Decimal::from(cents);
    let mut shares: Vec<i64> = weights
        .iter()
        .map(|w| (total * *w / weight_sum).floor().to_i64().unwrap_or(0))
        .collect();

    let allocated: i64 = shares.iter().sum();
    let largest = (0..weights.len())
        .max_by(|&a, &b| weights[a].cmp(&weights[b]).then(b.cmp(&a)));
    if let Some(largest) = largest {
        shares[largest] += cents - allocated;
    }

    members
        .iter()
        .zip(weights.iter().zip(shares))
        .map(|((member_id, _), (weight, share))| {
            if share <= 0 {
                return Err(Error::validation(
                    "participants",
                    format!("{} would owe nothing under a ratio split", member_id),
                ));
            }
            Ok(Participant {
                member_id: member_id.clone(),
                amount: from_cents(share),
                percentage: Some(round_currency(*weight / weight_sum * Decimal::ONE_HUNDRED)),
            })
        })
        .collect()
}

/// Use caller-provided amounts, checking they add up to `amount`
pub fn custom_split(amount: Decimal, shares: &[(MemberId, Decimal)]) -> Result<Vec<Participant>> {
    split_total(amount, shares.len())?;

    let participants: Vec<Participant> = shares
        .iter()
        .map(|(member_id, share)| Participant {
            member_id: member_id.clone(),
            amount: *share,
            percentage: None,
        })
        .collect();

    crate::validation::validate_participants(amount, &participants)?;
    Ok(participants)
}

/// Validate the total and participant count, returning the total in cents
fn split_total(amount: Decimal, participants: usize) -> Result<i64> {
    if participants == 0 {
        return Err(Error::validation("participants", "at least one participant is required"));
    }
    if amount <= Decimal::ZERO || !has_cent_precision(amount) {
        return Err(Error::validation(
            "amount",
            format!("{} must be positive with at most two decimals", amount),
        ));
    }
    to_cents(amount)
        .ok_or_else(|| Error::validation("amount", format!("{} is out of range", amount)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ids(names: &[&str]) -> Vec<MemberId> {
        names.iter().map(|n| MemberId::new(*n)).collect()
    }

    fn amounts(participants: &[Participant]) -> Vec<Decimal> {
        participants.iter().map(|p| p.amount).collect()
    }

    #[test]
    fn test_equal_split_distributes_remainder() {
        let participants = equal_split(dec!(100), &ids(&["a", "b", "c"])).unwrap();
        assert_eq!(amounts(&participants), vec![dec!(33.34), dec!(33.33), dec!(33.33)]);

        let total: Decimal = participants.iter().map(|p| p.amount).sum();
        assert_eq!(total, dec!(100));
    }

    #[test]
    fn test_equal_split_too_small() {
        assert!(equal_split(dec!(0.02), &ids(&["a", "b", "c"])).is_err());
        assert!(equal_split(dec!(10), &[]).is_err());
        assert!(equal_split(dec!(10.001), &ids(&["a"])).is_err());
    }

    #[test]
    fn test_ratio_split() {
        let members = vec![
            (MemberId::new("a"), dec!(0.5)),
            (MemberId::new("b"), dec!(0.3)),
            (MemberId::new("c"), dec!(0.2)),
        ];

        let participants = ratio_split(dec!(99.99), &members).unwrap();

        // 49.995 / 29.997 / 19.998 floored, two residual cents to the largest share
        assert_eq!(amounts(&participants), vec![dec!(50.01), dec!(29.99), dec!(19.99)]);
        let total: Decimal = participants.iter().map(|p| p.amount).sum();
        assert_eq!(total, dec!(99.99));
        assert_eq!(participants[0].percentage, Some(dec!(50)));
    }

    #[test]
    fn test_ratio_split_all_zero_falls_back_to_equal_weights() {
        let members = vec![
            (MemberId::new("a"), Decimal::ZERO),
            (MemberId::new("b"), Decimal::ZERO),
        ];

        let participants = ratio_split(dec!(10), &members).unwrap();
        assert_eq!(amounts(&participants), vec![dec!(5), dec!(5)]);
        assert_eq!(participants[1].percentage, Some(dec!(50)));
    }

    #[test]
    fn test_ratio_split_zero_share_rejected() {
        let members = vec![
            (MemberId::new("a"), dec!(1)),
            (MemberId::new("b"), Decimal::ZERO),
        ];
        assert!(ratio_split(dec!(10), &members).is_err());
    }

    #[test]
    fn test_custom_split_must_sum() {
        let shares = vec![
            (MemberId::new("a"), dec!(7.50)),
            (MemberId::new("b"), dec!(2.50)),
        ];
        assert!(custom_split(dec!(10), &shares).is_ok());

        let err = custom_split(dec!(12), &shares).unwrap_err();
        assert!(matches!(err, Error::ParticipantSumMismatch { .. }));
    }
}
