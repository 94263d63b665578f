//! Durable storage for the pension ledger.
//!
//! [`LedgerStore`] keeps the authoritative state in SQLite; [`export_snapshot`]
//! writes a human-readable JSON copy. Both operate on
//! [`pension_core::LedgerSnapshot`], so the engine itself never touches disk.

mod atomic_write;
mod export;
mod ledger_store;
mod sqlite_util;

pub use export::{export_snapshot, read_export};
pub use ledger_store::LedgerStore;
