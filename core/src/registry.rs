//! Account registry: one account per identity.

use std::collections::HashMap;
use std::slice;

use pension_types::{
    Account, AccountId, Amount, BiologicalSex, Identity, LedgerError, LedgerRules, MAX_AMOUNT,
    PeriodId, SECONDS_PER_YEAR, Timestamp,
};

use crate::splitter::Split;

/// Everything a participant declares when opening an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    pub identity: Identity,
    pub biological_sex: BiologicalSex,
    pub age: u32,
    pub birth_year: i32,
    pub contribution: Amount,
}

/// Owns every [`Account`], indexed by sequential id and by owner identity.
///
/// Accounts are stored in creation order, so `accounts[id]` is the account
/// with that id and iteration order is registry order.
#[derive(Debug, Clone, Default)]
pub struct AccountRegistry {
    accounts: Vec<Account>,
    by_identity: HashMap<Identity, AccountId>,
}

impl AccountRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted accounts. Ids must be `0..n` in order and
    /// owners must be unique.
    pub(crate) fn from_accounts(accounts: Vec<Account>) -> Result<Self, LedgerError> {
        let mut by_identity = HashMap::with_capacity(accounts.len());
        for (index, account) in accounts.iter().enumerate() {
            if account.id.value() != index as u64 {
                return Err(LedgerError::CorruptSnapshot(format!(
                    "account at position {index} has id {}",
                    account.id
                )));
            }
            if by_identity
                .insert(account.owner.clone(), account.id)
                .is_some()
            {
                return Err(LedgerError::CorruptSnapshot(format!(
                    "identity {} owns more than one account",
                    account.owner
                )));
            }
        }
        Ok(Self {
            accounts,
            by_identity,
        })
    }

    /// Create an account with zero totals. The caller credits the opening
    /// contribution.
    ///
    /// Every check runs before anything is stored: a rejected enrollment
    /// leaves the registry untouched.
    pub fn open(
        &mut self,
        rules: &LedgerRules,
        enrollment: Enrollment,
        now: Timestamp,
    ) -> Result<AccountId, LedgerError> {
        let id = self.next_id();
        self.validate(rules, &enrollment)?;
        if enrollment.contribution > MAX_AMOUNT {
            return Err(LedgerError::Overflow { account: id });
        }
        let retirement_at =
            retirement_instant(rules, enrollment.age, now).ok_or(LedgerError::Overflow {
                account: id,
            })?;

        let Enrollment {
            identity,
            biological_sex,
            age,
            birth_year,
            ..
        } = enrollment;

        self.by_identity.insert(identity.clone(), id);
        self.accounts.push(Account {
            id,
            owner: identity,
            biological_sex,
            birth_year,
            age,
            created_at: now,
            retirement_at,
            cumulative_contribution: 0,
            cumulative_savings: 0,
            cumulative_solidarity: 0,
            retired_in: None,
        });
        Ok(id)
    }

    fn validate(&self, rules: &LedgerRules, enrollment: &Enrollment) -> Result<(), LedgerError> {
        if let Some(&account) = self.by_identity.get(&enrollment.identity) {
            return Err(LedgerError::AlreadyExists {
                identity: enrollment.identity.clone(),
                account,
            });
        }
        if enrollment.age < rules.minimum_age() {
            return Err(LedgerError::Underage {
                age: enrollment.age,
                minimum: rules.minimum_age(),
            });
        }
        if enrollment.contribution < rules.minimum_contribution() {
            return Err(LedgerError::BelowMinimum {
                amount: enrollment.contribution,
                minimum: rules.minimum_contribution(),
            });
        }
        Ok(())
    }

    /// Check that `identity` owns `account_id`.
    pub fn authorize(
        &self,
        account_id: AccountId,
        identity: &Identity,
    ) -> Result<&Account, LedgerError> {
        let account = self.get(account_id)?;
        if &account.owner != identity {
            return Err(LedgerError::NotOwner {
                account: account_id,
                identity: identity.clone(),
            });
        }
        Ok(account)
    }

    pub fn get(&self, account_id: AccountId) -> Result<&Account, LedgerError> {
        usize::try_from(account_id.value())
            .ok()
            .and_then(|index| self.accounts.get(index))
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    fn get_mut(&mut self, account_id: AccountId) -> Result<&mut Account, LedgerError> {
        usize::try_from(account_id.value())
            .ok()
            .and_then(|index| self.accounts.get_mut(index))
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    #[must_use]
    pub fn already_registered(&self, identity: &Identity) -> bool {
        self.by_identity.contains_key(identity)
    }

    #[must_use]
    pub fn account_of(&self, identity: &Identity) -> Option<AccountId> {
        self.by_identity.get(identity).copied()
    }

    /// Every account in registry order. The iterator is `Clone`, so a scan
    /// can be restarted over the same consistent view.
    pub fn all(&self) -> slice::Iter<'_, Account> {
        self.accounts.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Replace an account's running totals with a freshly computed split.
    pub(crate) fn credit(&mut self, account_id: AccountId, split: Split) -> Result<(), LedgerError> {
        let account = self.get_mut(account_id)?;
        account.cumulative_contribution = split.total;
        account.cumulative_savings = split.savings;
        account.cumulative_solidarity = split.solidarity;
        Ok(())
    }

    pub(crate) fn mark_retired(
        &mut self,
        account_id: AccountId,
        period: PeriodId,
    ) -> Result<(), LedgerError> {
        self.get_mut(account_id)?.retired_in = Some(period);
        Ok(())
    }

    fn next_id(&self) -> AccountId {
        AccountId::new(self.accounts.len() as u64)
    }
}

/// `created_at + (retirement age - declared age)`, both in ledger seconds.
///
/// Falls before `now` when the declared age already exceeds the retirement
/// age; such an account retires at the next cutoff.
fn retirement_instant(rules: &LedgerRules, age: u32, now: Timestamp) -> Option<Timestamp> {
    let age_seconds = i64::from(age).checked_mul(SECONDS_PER_YEAR)?;
    let remaining = rules.retirement_age_seconds().checked_sub(age_seconds)?;
    now.checked_add_seconds(remaining)
}
