//! Accounting engine for the pooled pension ledger.
//!
//! Participants open one account each, contribute over time, and every
//! contribution total is split into a personal savings share and a pooled
//! solidarity share. Contributions are bucketed by the accounting period
//! (cutoff) that was open when they arrived; each cutoff advance files the
//! accounts that have reached retirement into the closing period's record.
//!
//! [`Ledger`] is the operation surface; [`SharedLedger`] wraps it behind a
//! single lock for multi-threaded hosts.

pub mod period;
pub mod registry;
pub mod retirement;
pub mod splitter;

mod ledger;
mod shared;
mod snapshot;

pub use ledger::{CutoffReport, Ledger, PoolTotals};
pub use period::{Cutoff, PeriodLedger};
pub use registry::{AccountRegistry, Enrollment};
pub use shared::SharedLedger;
pub use snapshot::LedgerSnapshot;
pub use splitter::{SAVINGS_PERCENT, Split, checked_split, split_total};
