//! Savings / solidarity split of a contribution total.
//!
//! The split is always recomputed from the running total rather than applied
//! per deposit, so floor rounding never accumulates across deposits and
//! `savings + solidarity == total` holds exactly after every operation.

use pension_types::{Amount, MAX_AMOUNT};

/// Share of every contribution total credited to personal savings.
pub const SAVINGS_PERCENT: u64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    pub total: Amount,
    pub savings: Amount,
    pub solidarity: Amount,
}

/// Split a running total. `savings = floor(total * 24 / 100)`.
#[must_use]
pub fn split_total(total: Amount) -> Split {
    // Widened so `total * 24` cannot overflow; the quotient is <= total.
    let savings = (u128::from(total) * u128::from(SAVINGS_PERCENT) / 100) as Amount;
    Split {
        total,
        savings,
        solidarity: total - savings,
    }
}

/// Add `increment` to `previous` and split the new total.
///
/// `None` if the new total would exceed [`MAX_AMOUNT`].
#[must_use]
pub fn checked_split(previous: Amount, increment: Amount) -> Option<Split> {
    previous
        .checked_add(increment)
        .filter(|total| *total <= MAX_AMOUNT)
        .map(split_total)
}
