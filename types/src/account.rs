use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, BiologicalSex, Identity, PeriodId, Timestamp};

/// A participant's pension account.
///
/// Created once per identity and never destroyed. Deposits change only the
/// three running totals; `retired_in` is set once, when a cutoff advance
/// files the account into a retirement record.
///
/// Invariant: `cumulative_savings + cumulative_solidarity ==
/// cumulative_contribution`, with savings the floored 24% share of the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub owner: Identity,
    pub biological_sex: BiologicalSex,
    pub birth_year: i32,
    /// Age in years as declared at creation. Never recomputed.
    pub age: u32,
    pub created_at: Timestamp,
    pub retirement_at: Timestamp,
    pub cumulative_contribution: Amount,
    pub cumulative_savings: Amount,
    pub cumulative_solidarity: Amount,
    #[serde(default)]
    pub retired_in: Option<PeriodId>,
}

impl Account {
    #[must_use]
    pub fn balance(&self) -> AccountBalance {
        AccountBalance {
            age: self.age,
            created_at: self.created_at,
            retirement_at: self.retirement_at,
            total_savings: self.cumulative_savings,
            total_solidary: self.cumulative_solidarity,
            cumulative_contribution: self.cumulative_contribution,
            retired_in: self.retired_in,
        }
    }

    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.retired_in.is_some()
    }

    #[must_use]
    pub fn is_eligible_at(&self, now: Timestamp) -> bool {
        self.retirement_at <= now
    }
}

/// Read-only balance view returned by `account_balance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccountBalance {
    pub age: u32,
    pub created_at: Timestamp,
    pub retirement_at: Timestamp,
    pub total_savings: Amount,
    pub total_solidary: Amount,
    pub cumulative_contribution: Amount,
    pub retired_in: Option<PeriodId>,
}
