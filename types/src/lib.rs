//! Core domain types for the pension ledger.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

mod account;
mod error;
mod identity;
mod ids;
mod period;
mod settings;
mod time;

pub use account::{Account, AccountBalance};
pub use error::{ErrorKind, LedgerError};
pub use identity::{BiologicalSex, EmptyIdentityError, Identity, ParseSexError};
pub use ids::{AccountId, PeriodId};
pub use period::{ContributionEntry, Period, RetireeEntry};
pub use settings::{LedgerRules, RulesError};
pub use time::{SECONDS_PER_YEAR, Timestamp};

/// Monetary amount in the smallest currency unit.
pub type Amount = u64;

/// Ceiling for any running total. Totals are persisted as signed 64-bit
/// integers, so nothing above `i64::MAX` is ever accepted.
pub const MAX_AMOUNT: Amount = i64::MAX as Amount;
