//! Expense workflows
//!
//! `ExpenseBook` owns the expense list and the cached "who owes whom" list.
//! Every mutation validates first, writes the expense list conditionally on
//! the version it read, then recomputes and stores the balance cache.

use crate::{
    balances::BalanceAggregator,
    config::NettingConfig,
    netting::NettingEngine,
    types::*,
    validation::validate_expense,
    Error, Result,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use storage::{keys, Collection, KeyValueStore};
use uuid::Uuid;

/// New expense input
#[derive(Debug, Clone)]
pub struct ExpenseDraft {
    /// Description
    pub description: String,
    /// Total amount
    pub amount: Decimal,
    /// Currency
    pub currency: Currency,
    /// Category
    pub category: String,
    /// Member who paid
    pub payer_id: MemberId,
    /// Split mode
    pub split_mode: SplitMode,
    /// Shares
    pub participants: Vec<Participant>,
    /// Notes
    pub notes: Option<String>,
    /// When the expense occurred
    pub datetime: DateTime<Utc>,
    /// Member recording the expense
    pub created_by: MemberId,
}

/// Partial expense update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct ExpensePatch {
    /// Description
    pub description: Option<String>,
    /// Total amount
    pub amount: Option<Decimal>,
    /// Currency
    pub currency: Option<Currency>,
    /// Category
    pub category: Option<String>,
    /// Payer
    pub payer_id: Option<MemberId>,
    /// Split mode
    pub split_mode: Option<SplitMode>,
    /// Shares
    pub participants: Option<Vec<Participant>>,
    /// `Some(None)` clears the notes
    pub notes: Option<Option<String>>,
    /// Occurrence time
    pub datetime: Option<DateTime<Utc>>,
}

impl ExpensePatch {
    fn apply(self, expense: &mut Expense) {
        if let Some(description) = self.description {
            expense.description = description;
        }
        if let Some(amount) = self.amount {
            expense.amount = amount;
        }
        if let Some(currency) = self.currency {
            expense.currency = currency;
        }
        if let Some(category) = self.category {
            expense.category = category;
        }
        if let Some(payer_id) = self.payer_id {
            expense.payer_id = payer_id;
        }
        if let Some(split_mode) = self.split_mode {
            expense.split_mode = split_mode;
        }
        if let Some(participants) = self.participants {
            expense.participants = participants;
        }
        if let Some(notes) = self.notes {
            expense.notes = notes;
        }
        if let Some(datetime) = self.datetime {
            expense.datetime = datetime;
        }
    }
}

/// Expense listing filter (unsettled expenses only)
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    /// Exact category
    pub category: Option<String>,
    /// Member as payer or participant
    pub member_id: Option<MemberId>,
    /// Inclusive lower bound on `datetime`
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `datetime`
    pub to: Option<DateTime<Utc>>,
}

impl ExpenseFilter {
    fn matches(&self, expense: &Expense) -> bool {
        if expense.is_settled {
            return false;
        }
        if let Some(category) = &self.category {
            if &expense.category != category {
                return false;
            }
        }
        if let Some(member_id) = &self.member_id {
            if !expense.involves(member_id) {
                return false;
            }
        }
        if self.from.map_or(false, |from| expense.datetime < from) {
            return false;
        }
        if self.to.map_or(false, |to| expense.datetime > to) {
            return false;
        }
        true
    }
}

/// Result of an expense mutation
#[derive(Debug, Clone)]
pub struct ExpenseChange {
    /// Expense after the change
    pub expense: Expense,
    /// Recomputed balance cache
    pub balances: Vec<Balance>,
}

/// Expense book
#[derive(Debug, Clone)]
pub struct ExpenseBook {
    expenses: Collection<Expense>,
    members: Collection<Member>,
    balances: Collection<Balance>,
    aggregator: BalanceAggregator,
}

impl ExpenseBook {
    /// Create expense book over a store
    pub fn new(store: Arc<dyn KeyValueStore>, config: NettingConfig) -> Self {
        Self {
            expenses: Collection::new(Arc::clone(&store), keys::EXPENSES),
            members: Collection::new(Arc::clone(&store), keys::MEMBERS),
            balances: Collection::new(store, keys::BALANCES),
            aggregator: BalanceAggregator::new(NettingEngine::new(config)),
        }
    }

    /// Record a new expense
    pub fn create_expense(&self, draft: ExpenseDraft) -> Result<ExpenseChange> {
        let members = self.members.load()?;
        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4(),
            description: draft.description,
            amount: draft.amount,
            currency: draft.currency,
            category: draft.category,
            payer_id: draft.payer_id,
            split_mode: draft.split_mode,
            participants: draft.participants,
            notes: draft.notes,
            datetime: draft.datetime,
            created_by: draft.created_by,
            is_settled: false,
            settled_at: None,
            created_at: now,
            updated_at: now,
        };
        validate_expense(&expense, &members)?;

        let balances = self.expenses.update(|expenses| {
            expenses.push(expense.clone());
            self.aggregator.calculate_balances(expenses, &members)
        })?;
        self.balances.save(&balances)?;

        tracing::info!(
            expense_id = %expense.id,
            amount = %expense.amount,
            currency = %expense.currency,
            payer = %expense.payer_id,
            "Expense created"
        );

        Ok(ExpenseChange { expense, balances })
    }

    /// Apply a partial update to an unsettled expense
    ///
    /// The merged expense is validated as a whole, so a new amount must come
    /// with participants that still add up to it.
    pub fn update_expense(&self, id: Uuid, patch: ExpensePatch) -> Result<ExpenseChange> {
        let members = self.members.load()?;

        let (expense, balances) = self.expenses.update(|expenses| {
            let index = find(expenses, id)?;
            if expenses[index].is_settled {
                return Err(Error::ExpenseSettled(id));
            }

            let mut updated = expenses[index].clone();
            patch.apply(&mut updated);
            updated.updated_at = Utc::now();
            validate_expense(&updated, &members)?;

            expenses[index] = updated.clone();
            let balances = self.aggregator.calculate_balances(expenses, &members)?;
            Ok((updated, balances))
        })?;
        self.balances.save(&balances)?;

        tracing::info!(expense_id = %id, "Expense updated");
        Ok(ExpenseChange { expense, balances })
    }

    /// Delete an expense; only its creator may do so
    pub fn delete_expense(&self, id: Uuid, member_id: &MemberId) -> Result<Vec<Balance>> {
        let members = self.members.load()?;

        let balances = self.expenses.update(|expenses| {
            let index = find(expenses, id)?;
            if &expenses[index].created_by != member_id {
                return Err(Error::NotCreator {
                    expense_id: id,
                    member_id: member_id.clone(),
                });
            }

            expenses.remove(index);
            self.aggregator.calculate_balances(expenses, &members)
        })?;
        self.balances.save(&balances)?;

        tracing::info!(expense_id = %id, deleted_by = %member_id, "Expense deleted");
        Ok(balances)
    }

    /// Mark an expense as settled, removing it from balances
    pub fn settle_expense(&self, id: Uuid, settled_by: &MemberId) -> Result<ExpenseChange> {
        let members = self.members.load()?;

        let (expense, balances) = self.expenses.update(|expenses| {
            let index = find(expenses, id)?;
            let expense = &mut expenses[index];
            if expense.is_settled {
                return Err(Error::AlreadySettled(id));
            }

            let now = Utc::now();
            expense.is_settled = true;
            expense.settled_at = Some(now);
            expense.updated_at = now;
            let settled = expense.clone();

            let balances = self.aggregator.calculate_balances(expenses, &members)?;
            Ok((settled, balances))
        })?;
        self.balances.save(&balances)?;

        tracing::info!(expense_id = %id, settled_by = %settled_by, "Expense settled");
        Ok(ExpenseChange { expense, balances })
    }

    /// Recompute the balance cache from scratch
    pub fn recalculate_balances(&self) -> Result<Vec<Balance>> {
        let expenses = self.expenses.load()?;
        let members = self.members.load()?;

        let balances = self.aggregator.calculate_balances(&expenses, &members)?;
        self.balances.save(&balances)?;

        tracing::info!(transfers = balances.len(), "Balances recalculated");
        Ok(balances)
    }

    /// Cached balances, amounts rounded to two places
    pub fn balances(&self) -> Result<Vec<Balance>> {
        let mut balances = self.balances.load()?;
        for balance in &mut balances {
            balance.amount = round_currency(balance.amount);
        }
        Ok(balances)
    }

    /// Unsettled expenses matching `filter`, in insertion order
    pub fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        Ok(self
            .expenses
            .load()?
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect())
    }

    /// Get expense by ID, settled or not
    pub fn get_expense(&self, id: Uuid) -> Result<Expense> {
        self.expenses
            .load()?
            .into_iter()
            .find(|e| e.id == id)
            .ok_or(Error::ExpenseNotFound(id))
    }
}

fn find(expenses: &[Expense], id: Uuid) -> Result<usize> {
    expenses
        .iter()
        .position(|e| e.id == id)
        .ok_or(Error::ExpenseNotFound(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{roster::MemberRoster, split::equal_split};
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use storage::MemoryStore;

    struct Household {
        roster: MemberRoster,
        book: ExpenseBook,
        alice: MemberId,
        bob: MemberId,
        carol: MemberId,
    }

    fn household() -> Household {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let roster = MemberRoster::new(Arc::clone(&store), Default::default());
        let alice = roster.add_member("Alice", "#FF0000", dec!(0.4)).unwrap().id;
        let bob = roster.add_member("Bob", "#00FF00", dec!(0.3)).unwrap().id;
        let carol = roster.add_member("Carol", "#0000FF", dec!(0.3)).unwrap().id;
        Household {
            roster,
            book: ExpenseBook::new(store, NettingConfig::default()),
            alice,
            bob,
            carol,
        }
    }

    fn draft(payer: &MemberId, amount: Decimal, members: &[MemberId]) -> ExpenseDraft {
        ExpenseDraft {
            description: "Groceries".into(),
            amount,
            currency: Currency::usd(),
            category: "Groceries".into(),
            payer_id: payer.clone(),
            split_mode: SplitMode::Equal,
            participants: equal_split(amount, members).unwrap(),
            notes: None,
            datetime: Utc::now(),
            created_by: payer.clone(),
        }
    }

    #[test]
    fn test_create_expense_updates_balances() {
        let h = household();
        let all = [h.alice.clone(), h.bob.clone(), h.carol.clone()];

        let change = h.book.create_expense(draft(&h.alice, dec!(90), &all)).unwrap();

        assert_eq!(change.balances.len(), 2);
        assert!(change.balances.iter().all(|b| b.to_member_id == h.alice));
        assert!(change.balances.iter().all(|b| b.amount == dec!(30)));
        assert_eq!(h.book.balances().unwrap(), change.balances);
    }

    #[test]
    fn test_create_rejects_huge_amount() {
        let h = household();
        let pair = [h.alice.clone(), h.bob.clone()];
        let mut huge = draft(&h.alice, dec!(100), &pair);
        huge.amount = dec!(70000000000000000000000000000);
        huge.participants[0].amount = dec!(35000000000000000000000000000);
        huge.participants[1].amount = dec!(35000000000000000000000000000);

        let err = h.book.create_expense(huge).unwrap_err();
        assert!(matches!(err, Error::Validation { field: "amount", .. }));
        assert!(h.book.list_expenses(&ExpenseFilter::default()).unwrap().is_empty());
        assert!(h.book.balances().unwrap().is_empty());
    }

    #[test]
    fn test_create_rejects_inactive_participant() {
        let h = household();
        h.roster.deactivate_member(&h.carol).unwrap();
        let all = [h.alice.clone(), h.bob.clone(), h.carol.clone()];

        let err = h.book.create_expense(draft(&h.alice, dec!(90), &all)).unwrap_err();
        assert!(matches!(err, Error::InactiveMember(id) if id == h.carol));
        assert!(h.book.list_expenses(&ExpenseFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn test_update_revalidates_merged_expense() {
        let h = household();
        let pair = [h.alice.clone(), h.bob.clone()];
        let id = h.book.create_expense(draft(&h.alice, dec!(50), &pair)).unwrap().expense.id;

        // New amount without new participants no longer sums
        let bad = ExpensePatch {
            amount: Some(dec!(60)),
            ..Default::default()
        };
        assert!(matches!(
            h.book.update_expense(id, bad),
            Err(Error::ParticipantSumMismatch { .. })
        ));

        let good = ExpensePatch {
            amount: Some(dec!(60)),
            participants: Some(equal_split(dec!(60), &pair).unwrap()),
            notes: Some(Some("split evenly".into())),
            ..Default::default()
        };
        let change = h.book.update_expense(id, good).unwrap();
        assert_eq!(change.expense.amount, dec!(60));
        assert_eq!(change.expense.notes.as_deref(), Some("split evenly"));
        assert_eq!(change.balances[0].amount, dec!(30));
    }

    #[test]
    fn test_settled_expense_is_immutable() {
        let h = household();
        let pair = [h.alice.clone(), h.bob.clone()];
        let id = h.book.create_expense(draft(&h.alice, dec!(50), &pair)).unwrap().expense.id;

        let change = h.book.settle_expense(id, &h.bob).unwrap();
        assert!(change.expense.is_settled);
        assert!(change.expense.settled_at.is_some());
        assert!(change.balances.is_empty());

        assert!(matches!(
            h.book.settle_expense(id, &h.bob),
            Err(Error::AlreadySettled(_))
        ));
        assert!(matches!(
            h.book.update_expense(id, ExpensePatch::default()),
            Err(Error::ExpenseSettled(_))
        ));
        assert!(h.book.get_expense(id).unwrap().is_settled);
    }

    #[test]
    fn test_only_creator_can_delete() {
        let h = household();
        let pair = [h.alice.clone(), h.bob.clone()];
        let id = h.book.create_expense(draft(&h.alice, dec!(50), &pair)).unwrap().expense.id;

        assert!(matches!(
            h.book.delete_expense(id, &h.bob),
            Err(Error::NotCreator { .. })
        ));

        let balances = h.book.delete_expense(id, &h.alice).unwrap();
        assert!(balances.is_empty());
        assert!(matches!(
            h.book.get_expense(id),
            Err(Error::ExpenseNotFound(_))
        ));
    }

    #[test]
    fn test_list_expenses_filters() {
        let h = household();
        let pair = [h.alice.clone(), h.bob.clone()];
        let mut old = draft(&h.alice, dec!(20), &pair);
        old.datetime = Utc::now() - Duration::days(10);
        old.category = "Bills".into();
        h.book.create_expense(old).unwrap();

        let solo = [h.carol.clone()];
        h.book.create_expense(draft(&h.carol, dec!(5), &solo)).unwrap();

        let by_member = ExpenseFilter {
            member_id: Some(h.bob.clone()),
            ..Default::default()
        };
        assert_eq!(h.book.list_expenses(&by_member).unwrap().len(), 1);

        let recent = ExpenseFilter {
            from: Some(Utc::now() - Duration::days(1)),
            ..Default::default()
        };
        let recent = h.book.list_expenses(&recent).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].payer_id, h.carol);

        let bills = ExpenseFilter {
            category: Some("Bills".into()),
            ..Default::default()
        };
        assert_eq!(h.book.list_expenses(&bills).unwrap().len(), 1);
    }

    #[test]
    fn test_recalculate_matches_incremental() {
        let h = household();
        let all = [h.alice.clone(), h.bob.clone(), h.carol.clone()];
        h.book.create_expense(draft(&h.alice, dec!(100), &all)).unwrap();
        let last = h.book.create_expense(draft(&h.bob, dec!(30), &all)).unwrap();

        assert_eq!(h.book.recalculate_balances().unwrap(), last.balances);
    }
}
