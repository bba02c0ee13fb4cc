//! Balance aggregation
//!
//! Derives each member's net position from unsettled expenses and hands the
//! result to the netting engine. Pure over its inputs; callers persist the
//! returned balances.

use crate::{
    netting::NettingEngine,
    types::*,
    Error, Result,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Net balance per member over unsettled expenses
///
/// Every active member starts at zero. The payer is credited the full amount
/// and each participant is debited their share, so a payer who also
/// participates nets the difference. Members referenced by an expense but
/// absent from the roster are appended in first-seen order.
pub fn net_balances(expenses: &[Expense], members: &[Member]) -> Result<Vec<NetBalance>> {
    let mut index: HashMap<&MemberId, usize> = HashMap::new();
    let mut nets: Vec<(&MemberId, Decimal)> = Vec::new();

    for member in members.iter().filter(|m| m.is_active) {
        slot(&mut index, &mut nets, &member.id);
    }

    for expense in expenses.iter().filter(|e| !e.is_settled) {
        let payer = slot(&mut index, &mut nets, &expense.payer_id);
        nets[payer].1 = nets[payer]
            .1
            .checked_add(expense.amount)
            .ok_or_else(|| out_of_range(&expense.payer_id))?;

        for participant in &expense.participants {
            let i = slot(&mut index, &mut nets, &participant.member_id);
            nets[i].1 = nets[i]
                .1
                .checked_sub(participant.amount)
                .ok_or_else(|| out_of_range(&participant.member_id))?;
        }
    }

    Ok(nets
        .into_iter()
        .map(|(member_id, net)| NetBalance {
            member_id: member_id.clone(),
            net,
        })
        .collect())
}

fn out_of_range(member_id: &MemberId) -> Error {
    Error::Netting(format!("Net balance out of range for {}", member_id))
}

fn slot<'a>(
    index: &mut HashMap<&'a MemberId, usize>,
    nets: &mut Vec<(&'a MemberId, Decimal)>,
    member_id: &'a MemberId,
) -> usize {
    *index.entry(member_id).or_insert_with(|| {
        nets.push((member_id, Decimal::ZERO));
        nets.len() - 1
    })
}

/// Balance aggregator
#[derive(Debug, Clone, Default)]
pub struct BalanceAggregator {
    engine: NettingEngine,
}

impl BalanceAggregator {
    /// Create aggregator on top of a netting engine
    pub fn new(engine: NettingEngine) -> Self {
        Self { engine }
    }

    /// Who owes whom across all unsettled expenses
    ///
    /// Settles in the currency of the first unsettled expense; a household is
    /// assumed to transact in one currency at a time.
    pub fn calculate_balances(
        &self,
        expenses: &[Expense],
        members: &[Member],
    ) -> Result<Vec<Balance>> {
        let mut unsettled = expenses.iter().filter(|e| !e.is_settled);

        let currency = match unsettled.next() {
            Some(first) => first.currency.clone(),
            None => return Ok(Vec::new()),
        };

        if unsettled.any(|e| e.currency != currency) {
            tracing::warn!(
                %currency,
                "Unsettled expenses span several currencies, settling everything in the first one"
            );
        }

        let nets = net_balances(expenses, members)?;
        self.engine.calculate_settlements(&nets, &currency)
    }
}

/// Compute balances with the default netting configuration
pub fn calculate_balances(expenses: &[Expense], members: &[Member]) -> Result<Vec<Balance>> {
    BalanceAggregator::default().calculate_balances(expenses, members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn member(id: &str, active: bool) -> Member {
        Member {
            id: MemberId::new(id),
            name: id.to_string(),
            color: "#336699".into(),
            share_ratio: dec!(0.5),
            created_at: Utc::now(),
            is_active: active,
        }
    }

    fn expense(payer: &str, amount: Decimal, shares: &[(&str, Decimal)]) -> Expense {
        let now = Utc::now();
        Expense {
            id: Uuid::new_v4(),
            description: "test".into(),
            amount,
            currency: Currency::usd(),
            category: "Other".into(),
            payer_id: MemberId::new(payer),
            split_mode: SplitMode::Custom,
            participants: shares
                .iter()
                .map(|(id, amount)| Participant {
                    member_id: MemberId::new(*id),
                    amount: *amount,
                    percentage: None,
                })
                .collect(),
            notes: None,
            datetime: now,
            created_by: MemberId::new(payer),
            is_settled: false,
            settled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_no_unsettled_expenses() {
        let members = vec![member("alice", true), member("bob", true)];
        let mut settled = expense("alice", dec!(100), &[("alice", dec!(50)), ("bob", dec!(50))]);
        settled.is_settled = true;

        assert!(calculate_balances(&[], &members).unwrap().is_empty());
        assert!(calculate_balances(&[settled], &members).unwrap().is_empty());
    }

    #[test]
    fn test_payer_nets_own_share() {
        let members = vec![member("alice", true), member("bob", true)];
        let expenses = vec![expense(
            "alice",
            dec!(100),
            &[("alice", dec!(50)), ("bob", dec!(50))],
        )];

        let nets = net_balances(&expenses, &members).unwrap();
        assert_eq!(
            nets,
            vec![
                NetBalance::new("alice", dec!(50)),
                NetBalance::new("bob", dec!(-50)),
            ]
        );

        let balances = calculate_balances(&expenses, &members).unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].from_member_id.as_str(), "bob");
        assert_eq!(balances[0].to_member_id.as_str(), "alice");
        assert_eq!(balances[0].amount, dec!(50));
    }

    #[test]
    fn test_inactive_members_only_when_referenced() {
        let members = vec![
            member("alice", true),
            member("bob", true),
            member("zed", false),
        ];
        let expenses = vec![expense("carol", dec!(30), &[("bob", dec!(30))])];

        let nets = net_balances(&expenses, &members).unwrap();
        let ids: Vec<&str> = nets.iter().map(|n| n.member_id.as_str()).collect();

        // Roster order first, then unknown members as they appear
        assert_eq!(ids, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_mutual_expenses_cancel() {
        let members = vec![member("alice", true), member("bob", true)];
        let expenses = vec![
            expense("alice", dec!(40), &[("alice", dec!(20)), ("bob", dec!(20))]),
            expense("bob", dec!(40), &[("alice", dec!(20)), ("bob", dec!(20))]),
        ];

        assert!(calculate_balances(&expenses, &members).unwrap().is_empty());
    }

    #[test]
    fn test_overflowing_totals_are_an_error() {
        let members = vec![member("alice", true), member("bob", true)];
        let expenses = vec![
            expense("alice", Decimal::MAX, &[("bob", Decimal::MAX)]),
            expense("alice", Decimal::MAX, &[("bob", Decimal::MAX)]),
        ];

        assert!(matches!(
            net_balances(&expenses, &members),
            Err(Error::Netting(_))
        ));
        assert!(matches!(
            calculate_balances(&expenses, &members),
            Err(Error::Netting(_))
        ));
    }

    #[test]
    fn test_settles_in_first_currency() {
        let members = vec![member("alice", true), member("bob", true)];
        let mut eur = expense("alice", dec!(10), &[("bob", dec!(10))]);
        eur.currency = Currency::parse("EUR").unwrap();
        let usd = expense("alice", dec!(5), &[("bob", dec!(5))]);

        let balances = calculate_balances(&[eur, usd], &members).unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].currency.code(), "EUR");
        assert_eq!(balances[0].amount, dec!(15));
    }
}
