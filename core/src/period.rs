//! Per-period contribution buckets and the cutoff state machine.
//!
//! Exactly one period is open at a time. `advance` closes it and opens the
//! next; closed periods accept no contributions, and their retirement record
//! is written once, right after the advance that closed them.
//!
//! A period id is the cutoff instant that opened it. Several cutoffs inside
//! one clock tick fall back to counting up from the current id, so ids stay
//! strictly increasing while `closed_at` keeps the instant actually given.

use std::collections::BTreeMap;

use pension_types::{
    AccountId, Amount, ContributionEntry, LedgerError, Period, PeriodId, RetireeEntry, Timestamp,
};

/// Result of closing a period: the id that closed and the id now open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cutoff {
    pub closing: PeriodId,
    pub opened: PeriodId,
}

#[derive(Debug, Clone)]
pub struct PeriodLedger {
    current: PeriodId,
    periods: BTreeMap<PeriodId, Period>,
    /// Period closed by the latest advance whose retirement record has not
    /// been filed yet.
    pending_filing: Option<PeriodId>,
}

impl PeriodLedger {
    /// Start with a single open period identified by `genesis`.
    #[must_use]
    pub fn new(genesis: Timestamp) -> Self {
        let id = PeriodId::new(genesis);
        let mut periods = BTreeMap::new();
        periods.insert(id, Period::open(id));
        Self {
            current: id,
            periods,
            pending_filing: None,
        }
    }

    /// Rebuild from persisted periods.
    ///
    /// The greatest id must be `current` and the only open period.
    pub(crate) fn from_periods(
        current: PeriodId,
        periods: Vec<Period>,
    ) -> Result<Self, LedgerError> {
        let mut map = BTreeMap::new();
        for period in periods {
            let id = period.id;
            if map.insert(id, period).is_some() {
                return Err(LedgerError::CorruptSnapshot(format!(
                    "period {id} appears more than once"
                )));
            }
        }

        match map.last_key_value() {
            Some((&last, period)) if last == current && period.is_open() => {}
            _ => {
                return Err(LedgerError::CorruptSnapshot(format!(
                    "current period {current} is not the latest open period"
                )));
            }
        }
        if let Some(open) = map.values().find(|p| p.id != current && p.is_open()) {
            return Err(LedgerError::CorruptSnapshot(format!(
                "period {} is open but is not current",
                open.id
            )));
        }
        let mut latest = map.values().next().map(|p| p.id.opened_at());
        for period in map.values() {
            if let Some(closed_at) = period.closed_at {
                if latest.is_some_and(|latest| closed_at < latest) {
                    return Err(LedgerError::CorruptSnapshot(format!(
                        "period {} closed before the cutoff preceding it",
                        period.id
                    )));
                }
                latest = Some(closed_at);
            }
        }

        Ok(Self {
            current,
            periods: map,
            pending_filing: None,
        })
    }

    #[must_use]
    pub fn current_period(&self) -> PeriodId {
        self.current
    }

    /// Append a contribution to the bucket of `period`, which must be the
    /// open one.
    pub fn record(
        &mut self,
        period: PeriodId,
        account_id: AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if period != self.current {
            return Err(if self.periods.contains_key(&period) {
                LedgerError::PeriodClosed {
                    period,
                    current: self.current,
                }
            } else {
                LedgerError::PeriodNotFound(period)
            });
        }
        self.period_mut(period)?
            .contributions
            .push(ContributionEntry { account_id, amount });
        Ok(())
    }

    /// Close the open period at `now` and open the next one.
    ///
    /// The new id is `now` when that is past the current id, otherwise the
    /// current id plus one second. Fails with `NonMonotonic` when `now` is
    /// earlier than [`Self::latest_cutoff_at`]; nothing changes in that case.
    pub fn advance(&mut self, now: Timestamp) -> Result<Cutoff, LedgerError> {
        self.ensure_not_before_latest(now)?;

        let closing = self.current;
        let opened = if now > closing.opened_at() {
            PeriodId::new(now)
        } else {
            closing
                .opened_at()
                .checked_add_seconds(1)
                .map(PeriodId::new)
                .ok_or(LedgerError::NonMonotonic {
                    latest: closing.opened_at(),
                    requested: now,
                })?
        };
        self.period_mut(closing)?.closed_at = Some(now);
        self.periods.insert(opened, Period::open(opened));
        self.current = opened;
        self.pending_filing = Some(closing);
        Ok(Cutoff { closing, opened })
    }

    /// Instant of the most recent cutoff, or the genesis instant before the
    /// first advance. Time-dependent operations must not go back past it.
    #[must_use]
    pub fn latest_cutoff_at(&self) -> Timestamp {
        self.periods
            .values()
            .rev()
            .find_map(|period| period.closed_at)
            .unwrap_or(self.current.opened_at())
    }

    /// `NonMonotonic` if `now` lies before [`Self::latest_cutoff_at`].
    pub fn ensure_not_before_latest(&self, now: Timestamp) -> Result<(), LedgerError> {
        let latest = self.latest_cutoff_at();
        if now < latest {
            return Err(LedgerError::NonMonotonic {
                latest,
                requested: now,
            });
        }
        Ok(())
    }

    /// Write the retirement record of the period closed by the latest
    /// advance. Accepted once per advance, for that period only.
    pub fn file_retirees(
        &mut self,
        period: PeriodId,
        retirees: Vec<RetireeEntry>,
    ) -> Result<(), LedgerError> {
        if self.pending_filing != Some(period) {
            return Err(LedgerError::RetirementNotFileable(period));
        }
        self.period_mut(period)?.retirees = retirees;
        self.pending_filing = None;
        Ok(())
    }

    pub fn period(&self, period: PeriodId) -> Result<&Period, LedgerError> {
        self.periods
            .get(&period)
            .ok_or(LedgerError::PeriodNotFound(period))
    }

    fn period_mut(&mut self, period: PeriodId) -> Result<&mut Period, LedgerError> {
        self.periods
            .get_mut(&period)
            .ok_or(LedgerError::PeriodNotFound(period))
    }

    /// Contributions recorded while `period` was open, in insertion order.
    pub fn bucket(&self, period: PeriodId) -> Result<&[ContributionEntry], LedgerError> {
        Ok(&self.period(period)?.contributions)
    }

    pub fn retirees(&self, period: PeriodId) -> Result<&[RetireeEntry], LedgerError> {
        Ok(&self.period(period)?.retirees)
    }

    /// Total contributed during `period` (the cutoff's general balance).
    pub fn bucket_total(&self, period: PeriodId) -> Result<Amount, LedgerError> {
        Ok(self.period(period)?.contribution_total())
    }

    /// All periods in cutoff order, the open one last.
    pub fn periods(&self) -> impl Iterator<Item = &Period> {
        self.periods.values()
    }
}
