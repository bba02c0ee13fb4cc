//! Storage keys

/// Household members
pub const MEMBERS: &str = "flatmate:members";

/// Shared expenses
pub const EXPENSES: &str = "flatmate:expenses";

/// Cached settlement list derived from unsettled expenses
pub const BALANCES: &str = "flatmate:balances";

/// Chore templates
pub const CHORES: &str = "flatmate:chores";

/// Chore assignments
pub const CHORE_ASSIGNMENTS: &str = "flatmate:choreAssignments";

/// Household settings singleton (currency, locale, PIN credential)
pub const SETTINGS: &str = "flatmate:settings";
