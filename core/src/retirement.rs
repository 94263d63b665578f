//! Retirement detection at cutoff time.

use std::collections::BTreeSet;

use pension_types::{Account, AccountId, Timestamp};

/// Accounts eligible at `now` that have not been filed before, in registry
/// order.
///
/// Pure: the caller owns `already_filed` and adds the returned ids to it
/// once they are recorded, which is what keeps every account in at most one
/// retirement record.
pub fn scan<'a, I>(accounts: I, now: Timestamp, already_filed: &BTreeSet<AccountId>) -> Vec<AccountId>
where
    I: IntoIterator<Item = &'a Account>,
{
    accounts
        .into_iter()
        .filter(|account| account.is_eligible_at(now) && !already_filed.contains(&account.id))
        .map(|account| account.id)
        .collect()
}
