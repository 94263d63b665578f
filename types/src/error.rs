use thiserror::Error;

use crate::{AccountId, Amount, Identity, PeriodId, Timestamp};

/// Coarse classification of a [`LedgerError`].
///
/// Callers branch on the kind; the variant carries the detail for messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input rejected by an admission rule before any mutation.
    Validation,
    /// The caller is not the owner of the account it tried to mutate.
    Authorization,
    /// Unknown account or period id.
    NotFound,
    /// The identity already holds an account.
    Conflict,
    /// Ordering or consistency violation in the host or persisted state.
    Invariant,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("{identity} already generated pension account {account}")]
    AlreadyExists {
        identity: Identity,
        account: AccountId,
    },
    #[error("participants must be {minimum} years or older (declared age {age})")]
    Underage { age: u32, minimum: u32 },
    #[error("contribution {amount} does not reach the minimum of {minimum}")]
    BelowMinimum { amount: Amount, minimum: Amount },
    #[error("{identity} does not own pension account {account}")]
    NotOwner {
        account: AccountId,
        identity: Identity,
    },
    #[error("pension account {0} not found")]
    AccountNotFound(AccountId),
    #[error("period {0} not found")]
    PeriodNotFound(PeriodId),
    #[error("period {period} is closed (open period is {current})")]
    PeriodClosed { period: PeriodId, current: PeriodId },
    #[error("instant {requested} is earlier than the latest cutoff at {latest}")]
    NonMonotonic {
        latest: Timestamp,
        requested: Timestamp,
    },
    #[error("contribution total of account {account} overflows")]
    Overflow { account: AccountId },
    #[error("retirement record of period {0} cannot be filed")]
    RetirementNotFileable(PeriodId),
    #[error("corrupt ledger snapshot: {0}")]
    CorruptSnapshot(String),
}

impl LedgerError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Underage { .. } | Self::BelowMinimum { .. } => ErrorKind::Validation,
            Self::NotOwner { .. } => ErrorKind::Authorization,
            Self::AccountNotFound(_) | Self::PeriodNotFound(_) | Self::PeriodClosed { .. } => {
                ErrorKind::NotFound
            }
            Self::AlreadyExists { .. } => ErrorKind::Conflict,
            Self::NonMonotonic { .. }
            | Self::Overflow { .. }
            | Self::RetirementNotFileable(_)
            | Self::CorruptSnapshot(_) => ErrorKind::Invariant,
        }
    }
}
