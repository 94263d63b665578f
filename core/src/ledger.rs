//! The ledger facade: the public operation surface.
//!
//! # Architecture
//!
//! ```text
//! Ledger
//! ├── rules: LedgerRules (admission + retirement thresholds)
//! ├── registry: AccountRegistry (identity -> account)
//! ├── periods: PeriodLedger (cutoff state machine + buckets)
//! └── filed: set of accounts already in a retirement record
//! ```
//!
//! Every mutation validates completely before it writes, so a rejected call
//! leaves the ledger exactly as it was.

use std::collections::BTreeSet;
use std::time::Duration;

use pension_types::{
    Account, AccountBalance, AccountId, Amount, ContributionEntry, Identity, LedgerError,
    LedgerRules, Period, PeriodId, RetireeEntry, Timestamp,
};

use crate::period::{Cutoff, PeriodLedger};
use crate::registry::{AccountRegistry, Enrollment};
use crate::retirement;
use crate::splitter::{checked_split, split_total};

/// Outcome of a cutoff advance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutoffReport {
    pub closed: PeriodId,
    pub opened: PeriodId,
    /// Accounts filed into the closed period's retirement record.
    pub retirees: Vec<AccountId>,
}

/// Ledger-wide sums over every account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolTotals {
    pub contributions: u128,
    pub savings: u128,
    pub solidarity: u128,
}

#[derive(Debug, Clone)]
pub struct Ledger {
    rules: LedgerRules,
    registry: AccountRegistry,
    periods: PeriodLedger,
    filed: BTreeSet<AccountId>,
}

impl Ledger {
    /// Empty ledger whose first period opens at `genesis`.
    #[must_use]
    pub fn new(rules: LedgerRules, genesis: Timestamp) -> Self {
        Self {
            rules,
            registry: AccountRegistry::new(),
            periods: PeriodLedger::new(genesis),
            filed: BTreeSet::new(),
        }
    }

    pub(crate) fn from_parts(
        rules: LedgerRules,
        registry: AccountRegistry,
        periods: PeriodLedger,
        filed: BTreeSet<AccountId>,
    ) -> Self {
        Self {
            rules,
            registry,
            periods,
            filed,
        }
    }

    #[must_use]
    pub fn rules(&self) -> &LedgerRules {
        &self.rules
    }

    /// Open an account and record its first contribution in the open period.
    ///
    /// `now` becomes the account's creation instant and may not precede the
    /// latest cutoff.
    pub fn mint(&mut self, enrollment: Enrollment, now: Timestamp) -> Result<AccountId, LedgerError> {
        self.periods.ensure_not_before_latest(now)?;
        let contribution = enrollment.contribution;
        let id = self.registry.open(&self.rules, enrollment, now)?;
        let split = split_total(contribution);
        self.registry.credit(id, split)?;
        let period = self.periods.current_period();
        self.periods.record(period, id, contribution)?;

        tracing::info!(
            account = %id,
            period = %period,
            contribution,
            savings = split.savings,
            solidarity = split.solidarity,
            "Pension account minted"
        );
        Ok(id)
    }

    /// Add `amount` to an account owned by `identity`.
    pub fn deposit(
        &mut self,
        account_id: AccountId,
        identity: &Identity,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let account = self.registry.authorize(account_id, identity)?;
        let split = checked_split(account.cumulative_contribution, amount)
            .ok_or(LedgerError::Overflow {
                account: account_id,
            })?;
        self.registry.credit(account_id, split)?;
        let period = self.periods.current_period();
        self.periods.record(period, account_id, amount)?;

        tracing::info!(
            account = %account_id,
            period = %period,
            amount,
            total = split.total,
            "Deposit recorded"
        );
        Ok(())
    }

    /// Close the open period at `now`, file newly eligible retirees under it,
    /// and open the next period.
    pub fn advance_cutoff(&mut self, now: Timestamp) -> Result<CutoffReport, LedgerError> {
        let Cutoff { closing, opened } = self.periods.advance(now)?;

        let retirees = retirement::scan(self.registry.all(), now, &self.filed);
        tracing::debug!(period = %closing, found = retirees.len(), "Retirement scan complete");

        let mut entries = Vec::with_capacity(retirees.len());
        for &account_id in &retirees {
            let owner = self.registry.get(account_id)?.owner.clone();
            self.registry.mark_retired(account_id, closing)?;
            self.filed.insert(account_id);
            entries.push(RetireeEntry { account_id, owner });
        }
        self.periods.file_retirees(closing, entries)?;

        tracing::info!(
            closed = %closing,
            opened = %opened,
            retirees = retirees.len(),
            "Cutoff advanced"
        );
        Ok(CutoffReport {
            closed: closing,
            opened,
            retirees,
        })
    }

    #[must_use]
    pub fn current_cutoff(&self) -> PeriodId {
        self.periods.current_period()
    }

    #[must_use]
    pub fn already_registered(&self, identity: &Identity) -> bool {
        self.registry.already_registered(identity)
    }

    #[must_use]
    pub fn account_of(&self, identity: &Identity) -> Option<AccountId> {
        self.registry.account_of(identity)
    }

    pub fn account_balance(&self, account_id: AccountId) -> Result<AccountBalance, LedgerError> {
        Ok(self.registry.get(account_id)?.balance())
    }

    pub fn query_account(&self, account_id: AccountId) -> Result<&Account, LedgerError> {
        self.registry.get(account_id)
    }

    pub fn query_period(&self, period: PeriodId) -> Result<&Period, LedgerError> {
        self.periods.period(period)
    }

    pub fn period_bucket(&self, period: PeriodId) -> Result<&[ContributionEntry], LedgerError> {
        self.periods.bucket(period)
    }

    pub fn period_total(&self, period: PeriodId) -> Result<Amount, LedgerError> {
        self.periods.bucket_total(period)
    }

    pub fn retirement_record(&self, period: PeriodId) -> Result<&[RetireeEntry], LedgerError> {
        self.periods.retirees(period)
    }

    #[must_use]
    pub fn retirement_age_threshold(&self) -> Duration {
        self.rules.retirement_age_threshold()
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.registry.all()
    }

    pub fn periods(&self) -> impl Iterator<Item = &Period> {
        self.periods.periods()
    }

    #[must_use]
    pub fn pool_totals(&self) -> PoolTotals {
        self.registry
            .all()
            .fold(PoolTotals::default(), |mut totals, account| {
                totals.contributions += u128::from(account.cumulative_contribution);
                totals.savings += u128::from(account.cumulative_savings);
                totals.solidarity += u128::from(account.cumulative_solidarity);
                totals
            })
    }
}
