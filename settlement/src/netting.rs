//! Debt simplification
//!
//! Reduces net balances to a short list of pairwise transfers.
//!
//! # Algorithm
//!
//! 1. Convert every net to integer cents (zero nets drop out)
//! 2. Split into creditors (owed money) and debtors (owe money)
//! 3. Sort both sides by magnitude, largest first (stable)
//! 4. Pair the largest creditor with the largest debtor, transfer the
//!    smaller of the two remainders, advance whichever side reaches zero
//!
//! Greedy largest-with-largest pairing is deterministic for a given input
//! order and yields at most `creditors + debtors - 1` transfers. It is a
//! heuristic: some inputs admit fewer transfers.
//!
//! # Example
//!
//! ```text
//! Net positions:
//!   alex:   +50.00
//!   bianca: -20.00
//!   chris:  -30.00
//!
//! Transfers:
//!   chris  pays alex 30.00
//!   bianca pays alex 20.00
//! ```

use crate::{
    config::NettingConfig,
    types::*,
    Error, Result,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Remaining position of one member, in cents
#[derive(Debug)]
struct Position<'a> {
    member_id: &'a MemberId,
    cents: i64,
}

/// Netting engine
#[derive(Debug, Clone, Default)]
pub struct NettingEngine {
    config: NettingConfig,
}

impl NettingEngine {
    /// Create new netting engine
    pub fn new(config: NettingConfig) -> Self {
        Self { config }
    }

    /// Compute transfers that zero out `net_balances`
    ///
    /// Entries for the same member are merged first. Returns an empty list
    /// when every net rounds to zero.
    pub fn calculate_settlements(
        &self,
        net_balances: &[NetBalance],
        currency: &Currency,
    ) -> Result<Vec<Settlement>> {
        if net_balances.is_empty() {
            return Ok(Vec::new());
        }

        let residual = net_balances
            .iter()
            .try_fold(Decimal::ZERO, |sum, b| sum.checked_add(b.net))
            .ok_or_else(|| Error::Netting("Net balance sum out of range".to_string()))?;
        if residual.abs() > self.config.conservation_tolerance {
            if self.config.enforce_conservation {
                return Err(Error::ConservationViolated { residual });
            }
            tracing::warn!(
                %residual,
                "Net balances do not conserve, residual will be left unmatched"
            );
        }

        let positions = Self::merge_positions(net_balances)?;

        let mut creditors: Vec<Position<'_>> = positions
            .iter()
            .filter(|p| p.cents > 0)
            .map(|p| Position {
                member_id: p.member_id,
                cents: p.cents,
            })
            .collect();

        let mut debtors: Vec<Position<'_>> = positions
            .iter()
            .filter(|p| p.cents < 0)
            .map(|p| Position {
                member_id: p.member_id,
                cents: -p.cents,
            })
            .collect();

        // Largest first; stable so equal magnitudes keep input order
        creditors.sort_by(|a, b| b.cents.cmp(&a.cents));
        debtors.sort_by(|a, b| b.cents.cmp(&a.cents));

        let mut settlements = Vec::with_capacity(creditors.len() + debtors.len());
        let mut ci = 0;
        let mut di = 0;

        while ci < creditors.len() && di < debtors.len() {
            let creditor = &mut creditors[ci];
            let debtor = &mut debtors[di];
            let cents = creditor.cents.min(debtor.cents);

            settlements.push(Settlement {
                from_member_id: debtor.member_id.clone(),
                to_member_id: creditor.member_id.clone(),
                amount: from_cents(cents),
                currency: currency.clone(),
            });

            creditor.cents -= cents;
            debtor.cents -= cents;

            if creditor.cents == 0 {
                ci += 1;
            }
            if debtor.cents == 0 {
                di += 1;
            }
        }

        let unmatched = creditors[ci..]
            .iter()
            .chain(&debtors[di..])
            .fold(0i64, |sum, p| sum.saturating_add(p.cents));
        if unmatched > 0 {
            tracing::debug!(unmatched_cents = unmatched, "Netting left residual unmatched");
        }

        tracing::debug!(
            members = positions.len(),
            transfers = settlements.len(),
            %currency,
            "Computed settlements"
        );

        Ok(settlements)
    }

    /// Sum nets per member in cents, keeping first-seen order
    fn merge_positions(net_balances: &[NetBalance]) -> Result<Vec<Position<'_>>> {
        let mut index: HashMap<&MemberId, usize> = HashMap::with_capacity(net_balances.len());
        let mut nets: Vec<(&MemberId, Decimal)> = Vec::with_capacity(net_balances.len());

        for balance in net_balances {
            match index.get(&balance.member_id) {
                Some(&i) => {
                    let member_id = &balance.member_id;
                    nets[i].1 = nets[i].1.checked_add(balance.net).ok_or_else(|| {
                        Error::Netting(format!("Net balance out of range for {}", member_id))
                    })?;
                }
                None => {
                    index.insert(&balance.member_id, nets.len());
                    nets.push((&balance.member_id, balance.net));
                }
            }
        }

        nets.into_iter()
            .map(|(member_id, net)| {
                // i64::MIN has no positive debtor magnitude
                let cents = to_cents(net).filter(|&c| c != i64::MIN).ok_or_else(|| {
                    Error::Netting(format!("Net balance out of range for {}: {}", member_id, net))
                })?;
                Ok(Position { member_id, cents })
            })
            .collect()
    }
}

/// Compute settlements with the default netting configuration
pub fn calculate_settlements(
    net_balances: &[NetBalance],
    currency: &Currency,
) -> Result<Vec<Settlement>> {
    NettingEngine::default().calculate_settlements(net_balances, currency)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn settlement(from: &str, to: &str, amount: Decimal) -> Settlement {
        Settlement {
            from_member_id: MemberId::new(from),
            to_member_id: MemberId::new(to),
            amount,
            currency: Currency::usd(),
        }
    }

    #[test]
    fn test_two_member_settlement() {
        let nets = vec![
            NetBalance::new("alice", dec!(100)),
            NetBalance::new("bob", dec!(-100)),
        ];

        let settlements = calculate_settlements(&nets, &Currency::usd()).unwrap();

        assert_eq!(settlements, vec![settlement("bob", "alice", dec!(100.00))]);
    }

    #[test]
    fn test_three_member_triangle() {
        let nets = vec![
            NetBalance::new("alex", dec!(50)),
            NetBalance::new("bianca", dec!(-20)),
            NetBalance::new("chris", dec!(-30)),
        ];

        let settlements = calculate_settlements(&nets, &Currency::usd()).unwrap();

        // Largest debtor is paired first
        assert_eq!(
            settlements,
            vec![
                settlement("chris", "alex", dec!(30)),
                settlement("bianca", "alex", dec!(20)),
            ]
        );
    }

    #[test]
    fn test_four_member_netting() {
        let nets = vec![
            NetBalance::new("amy", dec!(40)),
            NetBalance::new("bryan", dec!(10)),
            NetBalance::new("cara", dec!(-25)),
            NetBalance::new("derek", dec!(-25)),
        ];

        let settlements = calculate_settlements(&nets, &Currency::usd()).unwrap();

        assert_eq!(
            settlements,
            vec![
                settlement("cara", "amy", dec!(25)),
                settlement("derek", "amy", dec!(15)),
                settlement("derek", "bryan", dec!(10)),
            ]
        );
    }

    #[test]
    fn test_fractional_cent_rounding() {
        let nets = vec![
            NetBalance::new("a", dec!(10.01)),
            NetBalance::new("b", dec!(-3.339999)),
            NetBalance::new("c", dec!(-6.67)),
        ];

        let settlements = calculate_settlements(&nets, &Currency::usd()).unwrap();

        assert_eq!(
            settlements,
            vec![
                settlement("c", "a", dec!(6.67)),
                settlement("b", "a", dec!(3.34)),
            ]
        );
    }

    #[test]
    fn test_already_balanced() {
        let nets = vec![
            NetBalance::new("a", Decimal::ZERO),
            NetBalance::new("b", Decimal::ZERO),
            NetBalance::new("c", dec!(0.001)),
        ];

        assert!(calculate_settlements(&nets, &Currency::usd()).unwrap().is_empty());
        assert!(calculate_settlements(&[], &Currency::usd()).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_member_entries_merge() {
        let nets = vec![
            NetBalance::new("a", dec!(30)),
            NetBalance::new("b", dec!(-10)),
            NetBalance::new("a", dec!(-20)),
        ];

        let settlements = calculate_settlements(&nets, &Currency::usd()).unwrap();

        assert_eq!(settlements, vec![settlement("b", "a", dec!(10))]);
    }

    #[test]
    fn test_non_conserving_input_rejected() {
        let nets = vec![
            NetBalance::new("a", dec!(100)),
            NetBalance::new("b", dec!(-60)),
        ];

        let err = calculate_settlements(&nets, &Currency::usd()).unwrap_err();
        assert!(matches!(err, Error::ConservationViolated { residual } if residual == dec!(40)));
    }

    #[test]
    fn test_out_of_range_nets_are_an_error() {
        let nets = vec![
            NetBalance::new("a", Decimal::MAX),
            NetBalance::new("b", Decimal::MAX),
            NetBalance::new("c", Decimal::MIN),
        ];
        assert!(matches!(
            calculate_settlements(&nets, &Currency::usd()),
            Err(Error::Netting(_))
        ));

        // Conserving, but too large for integer cents
        let nets = vec![
            NetBalance::new("a", Decimal::MAX),
            NetBalance::new("b", Decimal::MIN),
        ];
        assert!(matches!(
            calculate_settlements(&nets, &Currency::usd()),
            Err(Error::Netting(_))
        ));
    }

    #[test]
    fn test_non_conserving_input_best_effort() {
        let engine = NettingEngine::new(NettingConfig {
            enforce_conservation: false,
            ..Default::default()
        });
        let nets = vec![
            NetBalance::new("a", dec!(100)),
            NetBalance::new("b", dec!(-60)),
        ];

        let settlements = engine.calculate_settlements(&nets, &Currency::usd()).unwrap();

        // Stops once the debtor side is exhausted
        assert_eq!(settlements, vec![settlement("b", "a", dec!(60))]);
    }

    #[test]
    fn test_transfer_count_bound() {
        let nets = vec![
            NetBalance::new("a", dec!(33.33)),
            NetBalance::new("b", dec!(33.33)),
            NetBalance::new("c", dec!(33.34)),
            NetBalance::new("d", dec!(-50)),
            NetBalance::new("e", dec!(-50)),
        ];

        let settlements = calculate_settlements(&nets, &Currency::usd()).unwrap();

        assert!(settlements.len() <= 3 + 2 - 1);
        let total: Decimal = settlements.iter().map(|s| s.amount).sum();
        assert_eq!(total, dec!(100));
        assert!(settlements.iter().all(|s| s.from_member_id != s.to_member_id));
    }
}
