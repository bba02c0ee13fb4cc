//! Core types for expense splitting and settlement
//!
//! Amounts are `Decimal` at rest and at every boundary, rounded to two
//! places. The netting engine converts them to integer cents internally.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Household member identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    /// Create member ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MemberId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// ISO 4217 currency code (three uppercase ASCII letters)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    /// Parse a currency code, `None` unless it is three uppercase letters
    pub fn parse(code: &str) -> Option<Self> {
        if code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()) {
            Some(Self(code.to_string()))
        } else {
            None
        }
    }

    /// US Dollar
    pub fn usd() -> Self {
        Self("USD".to_string())
    }

    /// ISO 4217 code
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Check the code shape (deserialized values bypass `parse`)
    pub fn is_valid(&self) -> bool {
        Self::parse(&self.0).is_some()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Round to two decimal places, midpoint away from zero
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert an amount to integer cents, `None` on overflow
pub fn to_cents(amount: Decimal) -> Option<i64> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Convert integer cents back to a two-place amount
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// True when the amount has at most two decimal places
pub fn has_cent_precision(amount: Decimal) -> bool {
    amount.normalize().scale() <= 2
}

/// Household member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Member ID
    pub id: MemberId,

    /// Display name (1-50 chars)
    pub name: String,

    /// Display color (`#RRGGBB`)
    pub color: String,

    /// Weight for ratio splits, in [0, 1]
    pub share_ratio: Decimal,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Inactive members are kept for history but excluded from new expenses
    pub is_active: bool,
}

/// How an expense is divided among participants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// Same share for everyone
    Equal,
    /// Proportional to member share ratios
    Ratio,
    /// Amounts entered by hand
    Custom,
}

/// One member's share of an expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Member owing the share
    pub member_id: MemberId,

    /// Amount owed
    pub amount: Decimal,

    /// Share in percent (ratio splits only)
    pub percentage: Option<Decimal>,
}

/// Shared expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// Expense ID
    pub id: Uuid,

    /// Description (1-200 chars)
    pub description: String,

    /// Total amount, positive with cent precision
    pub amount: Decimal,

    /// Currency
    pub currency: Currency,

    /// Free-form category (max 30 chars)
    pub category: String,

    /// Member who paid
    pub payer_id: MemberId,

    /// Split mode used to derive participant amounts
    pub split_mode: SplitMode,

    /// Shares; amounts sum to `amount`
    pub participants: Vec<Participant>,

    /// Optional notes (max 500 chars)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// When the expense occurred
    pub datetime: DateTime<Utc>,

    /// Member who recorded the expense
    pub created_by: MemberId,

    /// Settled expenses are immutable and excluded from balances
    pub is_settled: bool,

    /// Settlement timestamp
    pub settled_at: Option<DateTime<Utc>>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// Whether the member paid for or shares this expense
    pub fn involves(&self, member_id: &MemberId) -> bool {
        &self.payer_id == member_id || self.participants.iter().any(|p| &p.member_id == member_id)
    }
}

/// Net position of one member (positive = is owed money)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetBalance {
    /// Member ID
    pub member_id: MemberId,

    /// Total paid minus total owed
    pub net: Decimal,
}

impl NetBalance {
    /// Create net balance
    pub fn new(member_id: impl Into<MemberId>, net: Decimal) -> Self {
        Self {
            member_id: member_id.into(),
            net,
        }
    }
}

/// Directed payment that reduces net balances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    /// Member who pays
    pub from_member_id: MemberId,

    /// Member who receives
    pub to_member_id: MemberId,

    /// Positive amount, two decimal places
    pub amount: Decimal,

    /// Currency
    pub currency: Currency,
}

/// Persisted settlement cache entry ("who owes whom")
pub type Balance = Settlement;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cents_conversion() {
        assert_eq!(to_cents(Decimal::new(1001, 2)), Some(1001));
        assert_eq!(to_cents(Decimal::new(-3339999, 6)), Some(-334));
        assert_eq!(to_cents(Decimal::new(5, 3)), Some(1));
        assert_eq!(to_cents(Decimal::new(-5, 3)), Some(-1));
        assert_eq!(from_cents(-250), Decimal::new(-250, 2));
    }

    #[test]
    fn test_cents_out_of_range() {
        assert_eq!(to_cents(Decimal::MAX), None);
        assert_eq!(to_cents(Decimal::MIN), None);
        assert_eq!(to_cents(Decimal::from(i64::MAX)), None);
    }

    #[test]
    fn test_cent_precision() {
        assert!(has_cent_precision(Decimal::new(1999, 2)));
        assert!(has_cent_precision(Decimal::new(10000, 4))); // 1.0000
        assert!(!has_cent_precision(Decimal::new(1001, 3)));
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!(Currency::parse("EUR").unwrap().code(), "EUR");
        assert!(Currency::parse("eur").is_none());
        assert!(Currency::parse("EURO").is_none());
        assert!(Currency::parse("").is_none());
    }

    #[test]
    fn test_expense_serializes_camel_case() {
        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4(),
            description: "Rent".into(),
            amount: Decimal::new(10000, 2),
            currency: Currency::usd(),
            category: "Bills".into(),
            payer_id: MemberId::new("alice"),
            split_mode: SplitMode::Equal,
            participants: vec![Participant {
                member_id: MemberId::new("alice"),
                amount: Decimal::new(10000, 2),
                percentage: None,
            }],
            notes: None,
            datetime: now,
            created_by: MemberId::new("alice"),
            is_settled: false,
            settled_at: None,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&expense).unwrap();
        assert_eq!(json["payerId"], "alice");
        assert_eq!(json["splitMode"], "equal");
        assert_eq!(json["currency"], "USD");
        assert!(json.get("notes").is_none());

        let back: Expense = serde_json::from_value(json).unwrap();
        assert_eq!(back, expense);
    }
}
