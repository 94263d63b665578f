use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, Identity, PeriodId, Timestamp};

/// One contribution (mint or deposit) recorded while a period was open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionEntry {
    pub account_id: AccountId,
    pub amount: Amount,
}

/// One account filed as retired when its period was closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetireeEntry {
    pub account_id: AccountId,
    pub owner: Identity,
}

/// An accounting period ("cutoff").
///
/// Open while `closed_at` is `None`; only the open period accepts
/// contributions. The retirement bucket is written exactly once, by the
/// advance that closes the period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub id: PeriodId,
    #[serde(default)]
    pub closed_at: Option<Timestamp>,
    #[serde(default)]
    pub contributions: Vec<ContributionEntry>,
    #[serde(default)]
    pub retirees: Vec<RetireeEntry>,
}

impl Period {
    #[must_use]
    pub fn open(id: PeriodId) -> Self {
        Self {
            id,
            closed_at: None,
            contributions: Vec::new(),
            retirees: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    /// Sum of every contribution in the bucket.
    ///
    /// Saturates; a single account's total is already bounded by `Amount`.
    #[must_use]
    pub fn contribution_total(&self) -> Amount {
        self.contributions
            .iter()
            .fold(0, |acc: Amount, entry| acc.saturating_add(entry.amount))
    }
}
