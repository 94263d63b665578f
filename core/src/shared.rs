//! Thread-safe handle around a single [`Ledger`].
//!
//! Every operation takes the same lock, which puts all mutations in one
//! total order and means no reader ever observes a half-applied mint,
//! deposit or advance.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pension_types::{AccountId, Amount, Identity, LedgerError, Timestamp};

use crate::ledger::{CutoffReport, Ledger};
use crate::registry::Enrollment;
use crate::snapshot::LedgerSnapshot;

#[derive(Debug, Clone)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl SharedLedger {
    #[must_use]
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    // Mutations validate before writing, so a panic while the lock is held
    // cannot leave partial state behind; recovering the guard is sound.
    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mint(&self, enrollment: Enrollment, now: Timestamp) -> Result<AccountId, LedgerError> {
        self.lock().mint(enrollment, now)
    }

    pub fn deposit(
        &self,
        account_id: AccountId,
        identity: &Identity,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.lock().deposit(account_id, identity, amount)
    }

    pub fn advance_cutoff(&self, now: Timestamp) -> Result<CutoffReport, LedgerError> {
        self.lock().advance_cutoff(now)
    }

    /// Run a read-only query against a consistent view of the ledger.
    pub fn read<R>(&self, query: impl FnOnce(&Ledger) -> R) -> R {
        query(&*self.lock())
    }

    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.lock().snapshot()
    }
}
