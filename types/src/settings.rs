//! Resolved ledger rules shared across crates.
//!
//! Raw TOML structs (with `Option` fields) stay private in `pension-config`.
//! The config loader resolves them into [`LedgerRules`] at the parse
//! boundary; a `LedgerRules` value is proof the rules are consistent.

use std::time::Duration;

use crate::{Amount, SECONDS_PER_YEAR};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    #[error("retirement age must be at least one year")]
    ZeroRetirementAge,
    #[error("minimum age ({minimum_age}) must be below the retirement age ({retirement_age_years})")]
    MinimumAgeNotBelowRetirement {
        minimum_age: u32,
        retirement_age_years: u32,
    },
}

/// Validated admission and retirement rules.
///
/// Invariant: `0 < retirement_age_years` and
/// `minimum_age < retirement_age_years`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerRules {
    minimum_contribution: Amount,
    minimum_age: u32,
    retirement_age_years: u32,
}

impl LedgerRules {
    pub const DEFAULT_MINIMUM_CONTRIBUTION: Amount = 25;
    pub const DEFAULT_MINIMUM_AGE: u32 = 18;
    pub const DEFAULT_RETIREMENT_AGE_YEARS: u32 = 60;

    pub fn new(
        minimum_contribution: Amount,
        minimum_age: u32,
        retirement_age_years: u32,
    ) -> Result<Self, RulesError> {
        if retirement_age_years == 0 {
            return Err(RulesError::ZeroRetirementAge);
        }
        if minimum_age >= retirement_age_years {
            return Err(RulesError::MinimumAgeNotBelowRetirement {
                minimum_age,
                retirement_age_years,
            });
        }
        Ok(Self {
            minimum_contribution,
            minimum_age,
            retirement_age_years,
        })
    }

    #[must_use]
    pub const fn minimum_contribution(&self) -> Amount {
        self.minimum_contribution
    }

    #[must_use]
    pub const fn minimum_age(&self) -> u32 {
        self.minimum_age
    }

    #[must_use]
    pub const fn retirement_age_years(&self) -> u32 {
        self.retirement_age_years
    }

    /// Retirement age expressed in ledger seconds (365-day years).
    #[must_use]
    pub const fn retirement_age_seconds(&self) -> i64 {
        self.retirement_age_years as i64 * SECONDS_PER_YEAR
    }

    #[must_use]
    pub const fn retirement_age_threshold(&self) -> Duration {
        Duration::from_secs(self.retirement_age_seconds() as u64)
    }
}

impl Default for LedgerRules {
    fn default() -> Self {
        Self {
            minimum_contribution: Self::DEFAULT_MINIMUM_CONTRIBUTION,
            minimum_age: Self::DEFAULT_MINIMUM_AGE,
            retirement_age_years: Self::DEFAULT_RETIREMENT_AGE_YEARS,
        }
    }
}
