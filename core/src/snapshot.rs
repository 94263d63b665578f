//! Owned, serialisable copies of ledger state and validated restore.
//!
//! Storage backends persist a [`LedgerSnapshot`]; [`Ledger::restore`]
//! refuses any snapshot that breaks a ledger invariant instead of loading
//! it and failing later.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use pension_types::{Account, AccountId, LedgerError, LedgerRules, MAX_AMOUNT, Period, PeriodId};

use crate::ledger::Ledger;
use crate::period::PeriodLedger;
use crate::registry::AccountRegistry;
use crate::splitter::split_total;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub current_period: PeriodId,
    pub accounts: Vec<Account>,
    /// In cutoff order, the open period last.
    pub periods: Vec<Period>,
}

impl Ledger {
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            current_period: self.current_cutoff(),
            accounts: self.accounts().cloned().collect(),
            periods: self.periods().cloned().collect(),
        }
    }

    /// Rebuild a ledger from a snapshot, checking every invariant.
    pub fn restore(rules: LedgerRules, snapshot: LedgerSnapshot) -> Result<Self, LedgerError> {
        let LedgerSnapshot {
            current_period,
            accounts,
            periods,
        } = snapshot;

        for account in &accounts {
            check_split(account)?;
        }
        let filed = check_buckets(&accounts, &periods, current_period)?;

        let registry = AccountRegistry::from_accounts(accounts)?;
        let periods = PeriodLedger::from_periods(current_period, periods)?;
        Ok(Ledger::from_parts(rules, registry, periods, filed))
    }
}

fn corrupt(message: String) -> LedgerError {
    LedgerError::CorruptSnapshot(message)
}

fn check_split(account: &Account) -> Result<(), LedgerError> {
    if account.cumulative_contribution > MAX_AMOUNT {
        return Err(corrupt(format!(
            "account {} total {} exceeds the storable maximum",
            account.id, account.cumulative_contribution
        )));
    }
    let expected = split_total(account.cumulative_contribution);
    if account.cumulative_savings != expected.savings
        || account.cumulative_solidarity != expected.solidarity
    {
        return Err(corrupt(format!(
            "account {} split {}/{} does not match total {}",
            account.id,
            account.cumulative_savings,
            account.cumulative_solidarity,
            account.cumulative_contribution
        )));
    }
    Ok(())
}

/// Cross-check buckets against accounts and return the set of filed
/// retirees.
///
/// Each account's contributions across all buckets must add up to its
/// cumulative total, every retiree must be filed once under the period its
/// account names, and only closed periods may carry retirees.
fn check_buckets(
    accounts: &[Account],
    periods: &[Period],
    current: PeriodId,
) -> Result<BTreeSet<AccountId>, LedgerError> {
    let mut contributed: BTreeMap<AccountId, u128> = BTreeMap::new();
    let mut filed = BTreeSet::new();
    let lookup = move |id: AccountId| {
        usize::try_from(id.value())
            .ok()
            .and_then(|index| accounts.get(index))
            .filter(|account| account.id == id)
    };

    for period in periods {
        if period.id != current && period.closed_at.is_none() {
            return Err(corrupt(format!("period {} was never closed", period.id)));
        }
        if period.id == current && !period.retirees.is_empty() {
            return Err(corrupt(format!(
                "open period {} already has retirees",
                period.id
            )));
        }
        for entry in &period.contributions {
            if lookup(entry.account_id).is_none() {
                return Err(corrupt(format!(
                    "period {} references unknown account {}",
                    period.id, entry.account_id
                )));
            }
            *contributed.entry(entry.account_id).or_default() += u128::from(entry.amount);
        }
        for entry in &period.retirees {
            let Some(account) = lookup(entry.account_id) else {
                return Err(corrupt(format!(
                    "retirement record {} references unknown account {}",
                    period.id, entry.account_id
                )));
            };
            if account.owner != entry.owner || account.retired_in != Some(period.id) {
                return Err(corrupt(format!(
                    "retiree {} in period {} disagrees with its account",
                    entry.account_id, period.id
                )));
            }
            if !filed.insert(entry.account_id) {
                return Err(corrupt(format!(
                    "account {} is filed in more than one retirement record",
                    entry.account_id
                )));
            }
        }
    }

    for account in accounts {
        let recorded = contributed.get(&account.id).copied().unwrap_or(0);
        if recorded != u128::from(account.cumulative_contribution) {
            return Err(corrupt(format!(
                "account {} total {} does not match recorded contributions {recorded}",
                account.id, account.cumulative_contribution
            )));
        }
        if account.retired_in.is_some() && !filed.contains(&account.id) {
            return Err(corrupt(format!(
                "account {} is marked retired but missing from its retirement record",
                account.id
            )));
        }
    }

    Ok(filed)
}
