use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// Sequential account handle, assigned in creation order starting at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(u64);

impl AccountId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an accounting period: the cutoff instant at which it opened.
///
/// Ordering follows the instant, so a later cutoff always compares greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodId(Timestamp);

impl PeriodId {
    #[must_use]
    pub const fn new(opened_at: Timestamp) -> Self {
        Self(opened_at)
    }

    #[must_use]
    pub const fn opened_at(self) -> Timestamp {
        self.0
    }
}

impl fmt::Display for PeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_unix_seconds())
    }
}
