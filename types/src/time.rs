//! Instants on the ledger timeline.
//!
//! The ledger never reads a clock. Every time-dependent operation takes a
//! [`Timestamp`] from its caller, which keeps cutoff advancement and
//! retirement detection deterministic.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Seconds in a ledger year. Ages are converted with a flat 365-day year.
pub const SECONDS_PER_YEAR: i64 = 365 * 86_400;

/// Seconds since the Unix epoch.
///
/// Signed, because a retirement instant derived from a declared age can fall
/// before the account's creation (and, in principle, before the epoch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    #[must_use]
    pub const fn from_unix_seconds(seconds: i64) -> Self {
        Self(seconds)
    }

    #[must_use]
    pub const fn as_unix_seconds(self) -> i64 {
        self.0
    }

    #[must_use]
    pub fn from_datetime(value: DateTime<Utc>) -> Self {
        Self(value.timestamp())
    }

    /// `None` when the instant is outside chrono's representable range.
    #[must_use]
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.0, 0)
    }

    #[must_use]
    pub const fn checked_add_seconds(self, seconds: i64) -> Option<Self> {
        match self.0.checked_add(seconds) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(datetime) => write!(f, "{}", datetime.format("%Y-%m-%dT%H:%M:%SZ")),
            None => write!(f, "@{}", self.0),
        }
    }
}
