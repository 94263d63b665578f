//! SQLite-backed ledger persistence.
//!
//! The store holds exactly one ledger. `save` replaces the stored state with
//! a snapshot inside a single transaction, so a crash mid-save leaves the
//! previous state intact; `load` reads it back in the order the ledger
//! expects (accounts by id, periods by cutoff, bucket entries by insertion).

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension, Transaction, params};

use pension_core::LedgerSnapshot;
use pension_types::{
    Account, AccountId, ContributionEntry, Identity, Period, PeriodId, RetireeEntry, Timestamp,
};

use crate::sqlite_util::{open_owner_only, tighten_sidecars};

const CURRENT_PERIOD_KEY: &str = "current_period";

pub struct LedgerStore {
    db: Connection,
}

impl LedgerStore {
    const SCHEMA: &'static str = r"
        CREATE TABLE IF NOT EXISTS ledger_meta (
            key TEXT PRIMARY KEY,
            value INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY,
            owner TEXT NOT NULL UNIQUE,
            biological_sex TEXT NOT NULL,
            birth_year INTEGER NOT NULL,
            age INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            retirement_at INTEGER NOT NULL,
            cumulative_contribution INTEGER NOT NULL,
            cumulative_savings INTEGER NOT NULL,
            cumulative_solidarity INTEGER NOT NULL,
            retired_in INTEGER
        );

        CREATE TABLE IF NOT EXISTS periods (
            id INTEGER PRIMARY KEY,
            closed_at INTEGER
        );

        -- One row per mint or deposit, in arrival order within the period
        CREATE TABLE IF NOT EXISTS contributions (
            period_id INTEGER NOT NULL,
            seq INTEGER NOT NULL,
            account_id INTEGER NOT NULL,
            amount INTEGER NOT NULL,
            PRIMARY KEY (period_id, seq),
            FOREIGN KEY (period_id) REFERENCES periods(id) ON DELETE CASCADE,
            FOREIGN KEY (account_id) REFERENCES accounts(id)
        );

        CREATE TABLE IF NOT EXISTS retirees (
            period_id INTEGER NOT NULL,
            seq INTEGER NOT NULL,
            account_id INTEGER NOT NULL UNIQUE,
            owner TEXT NOT NULL,
            PRIMARY KEY (period_id, seq),
            FOREIGN KEY (period_id) REFERENCES periods(id) ON DELETE CASCADE,
            FOREIGN KEY (account_id) REFERENCES accounts(id)
        );
    ";

    /// Open or create the ledger database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let store = Self::initialize(open_owner_only(path)?)?;
        tighten_sidecars(path)?;
        tracing::debug!(path = %path.display(), "Opened ledger store");
        Ok(store)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory ledger store")?;
        Self::initialize(db)
    }

    fn initialize(db: Connection) -> Result<Self> {
        db.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=FULL; PRAGMA foreign_keys=ON;",
        )
        .context("Failed to set ledger store pragmas")?;
        db.execute_batch(Self::SCHEMA)
            .context("Failed to create ledger store schema")?;
        Ok(Self { db })
    }

    /// Replace the stored ledger with `snapshot`.
    pub fn save(&mut self, snapshot: &LedgerSnapshot) -> Result<()> {
        let tx = self
            .db
            .transaction()
            .context("Failed to start ledger store transaction")?;

        tx.execute_batch(
            "DELETE FROM retirees; DELETE FROM contributions; \
             DELETE FROM periods; DELETE FROM accounts; DELETE FROM ledger_meta;",
        )
        .context("Failed to clear ledger store")?;

        insert_accounts(&tx, &snapshot.accounts)?;
        insert_periods(&tx, &snapshot.periods)?;
        tx.execute(
            "INSERT INTO ledger_meta (key, value) VALUES (?1, ?2)",
            params![
                CURRENT_PERIOD_KEY,
                snapshot.current_period.opened_at().as_unix_seconds()
            ],
        )
        .context("Failed to store current period")?;

        tx.commit()
            .context("Failed to commit ledger store transaction")?;

        tracing::debug!(
            accounts = snapshot.accounts.len(),
            periods = snapshot.periods.len(),
            "Ledger saved"
        );
        Ok(())
    }

    /// Load the stored ledger, or `None` if nothing has been saved yet.
    pub fn load(&self) -> Result<Option<LedgerSnapshot>> {
        let current: Option<i64> = self
            .db
            .query_row(
                "SELECT value FROM ledger_meta WHERE key = ?1",
                [CURRENT_PERIOD_KEY],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to read current period")?;
        let Some(current) = current else {
            return Ok(None);
        };

        let accounts = self.load_accounts()?;
        let periods = self.load_periods()?;
        Ok(Some(LedgerSnapshot {
            current_period: period_id(current),
            accounts,
            periods,
        }))
    }

    fn load_accounts(&self) -> Result<Vec<Account>> {
        let mut stmt = self
            .db
            .prepare(
                "SELECT id, owner, biological_sex, birth_year, age, created_at, retirement_at,
                        cumulative_contribution, cumulative_savings, cumulative_solidarity,
                        retired_in
                 FROM accounts
                 ORDER BY id ASC",
            )
            .context("Failed to prepare account query")?;

        let rows = stmt
            .query_map([], |row| {
                Ok(AccountRow {
                    id: row.get(0)?,
                    owner: row.get(1)?,
                    biological_sex: row.get(2)?,
                    birth_year: row.get(3)?,
                    age: row.get(4)?,
                    created_at: row.get(5)?,
                    retirement_at: row.get(6)?,
                    cumulative_contribution: row.get(7)?,
                    cumulative_savings: row.get(8)?,
                    cumulative_solidarity: row.get(9)?,
                    retired_in: row.get(10)?,
                })
            })
            .context("Failed to query accounts")?;

        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(row.context("Failed to read account row")?.into_account()?);
        }
        Ok(accounts)
    }

    fn load_periods(&self) -> Result<Vec<Period>> {
        let mut periods: BTreeMap<i64, Period> = BTreeMap::new();

        let mut stmt = self
            .db
            .prepare("SELECT id, closed_at FROM periods ORDER BY id ASC")
            .context("Failed to prepare period query")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, Option<i64>>(1)?))
            })
            .context("Failed to query periods")?;
        for row in rows {
            let (id, closed_at) = row.context("Failed to read period row")?;
            let mut period = Period::open(period_id(id));
            period.closed_at = closed_at.map(Timestamp::from_unix_seconds);
            periods.insert(id, period);
        }

        let mut stmt = self
            .db
            .prepare(
                "SELECT period_id, account_id, amount FROM contributions
                 ORDER BY period_id ASC, seq ASC",
            )
            .context("Failed to prepare contribution query")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })
            .context("Failed to query contributions")?;
        for row in rows {
            let (period, account_id, amount) = row.context("Failed to read contribution row")?;
            let entry = ContributionEntry {
                account_id: AccountId::new(to_u64(account_id, "contribution account id")?),
                amount: to_u64(amount, "contribution amount")?,
            };
            periods
                .get_mut(&period)
                .ok_or_else(|| anyhow!("Contribution references unknown period {period}"))?
                .contributions
                .push(entry);
        }

        let mut stmt = self
            .db
            .prepare(
                "SELECT period_id, account_id, owner FROM retirees
                 ORDER BY period_id ASC, seq ASC",
            )
            .context("Failed to prepare retiree query")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .context("Failed to query retirees")?;
        for row in rows {
            let (period, account_id, owner) = row.context("Failed to read retiree row")?;
            let entry = RetireeEntry {
                account_id: AccountId::new(to_u64(account_id, "retiree account id")?),
                owner: identity(owner)?,
            };
            periods
                .get_mut(&period)
                .ok_or_else(|| anyhow!("Retiree references unknown period {period}"))?
                .retirees
                .push(entry);
        }

        Ok(periods.into_values().collect())
    }
}

fn insert_accounts(tx: &Transaction<'_>, accounts: &[Account]) -> Result<()> {
    let mut stmt = tx
        .prepare(
            "INSERT INTO accounts (id, owner, biological_sex, birth_year, age, created_at,
                                   retirement_at, cumulative_contribution, cumulative_savings,
                                   cumulative_solidarity, retired_in)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .context("Failed to prepare account insert")?;

    for account in accounts {
        stmt.execute(params![
            to_i64(account.id.value(), "account id")?,
            account.owner.as_str(),
            account.biological_sex.as_str(),
            account.birth_year,
            account.age,
            account.created_at.as_unix_seconds(),
            account.retirement_at.as_unix_seconds(),
            to_i64(account.cumulative_contribution, "cumulative contribution")?,
            to_i64(account.cumulative_savings, "cumulative savings")?,
            to_i64(account.cumulative_solidarity, "cumulative solidarity")?,
            account
                .retired_in
                .map(|period| period.opened_at().as_unix_seconds()),
        ])
        .with_context(|| format!("Failed to insert account {}", account.id))?;
    }
    Ok(())
}

fn insert_periods(tx: &Transaction<'_>, periods: &[Period]) -> Result<()> {
    let mut period_stmt = tx
        .prepare("INSERT INTO periods (id, closed_at) VALUES (?1, ?2)")
        .context("Failed to prepare period insert")?;
    let mut contribution_stmt = tx
        .prepare(
            "INSERT INTO contributions (period_id, seq, account_id, amount)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .context("Failed to prepare contribution insert")?;
    let mut retiree_stmt = tx
        .prepare(
            "INSERT INTO retirees (period_id, seq, account_id, owner)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .context("Failed to prepare retiree insert")?;

    for period in periods {
        let id = period.id.opened_at().as_unix_seconds();
        period_stmt
            .execute(params![id, period.closed_at.map(Timestamp::as_unix_seconds)])
            .with_context(|| format!("Failed to insert period {}", period.id))?;

        for (seq, entry) in period.contributions.iter().enumerate() {
            contribution_stmt
                .execute(params![
                    id,
                    seq as i64,
                    to_i64(entry.account_id.value(), "account id")?,
                    to_i64(entry.amount, "contribution amount")?,
                ])
                .with_context(|| format!("Failed to insert contribution in period {}", period.id))?;
        }
        for (seq, entry) in period.retirees.iter().enumerate() {
            retiree_stmt
                .execute(params![
                    id,
                    seq as i64,
                    to_i64(entry.account_id.value(), "account id")?,
                    entry.owner.as_str(),
                ])
                .with_context(|| format!("Failed to insert retiree in period {}", period.id))?;
        }
    }
    Ok(())
}

struct AccountRow {
    id: i64,
    owner: String,
    biological_sex: String,
    birth_year: i32,
    age: u32,
    created_at: i64,
    retirement_at: i64,
    cumulative_contribution: i64,
    cumulative_savings: i64,
    cumulative_solidarity: i64,
    retired_in: Option<i64>,
}

impl AccountRow {
    fn into_account(self) -> Result<Account> {
        Ok(Account {
            id: AccountId::new(to_u64(self.id, "account id")?),
            owner: identity(self.owner)?,
            biological_sex: self
                .biological_sex
                .parse()
                .with_context(|| format!("Invalid biological sex for account {}", self.id))?,
            birth_year: self.birth_year,
            age: self.age,
            created_at: Timestamp::from_unix_seconds(self.created_at),
            retirement_at: Timestamp::from_unix_seconds(self.retirement_at),
            cumulative_contribution: to_u64(self.cumulative_contribution, "cumulative contribution")?,
            cumulative_savings: to_u64(self.cumulative_savings, "cumulative savings")?,
            cumulative_solidarity: to_u64(self.cumulative_solidarity, "cumulative solidarity")?,
            retired_in: self.retired_in.map(period_id),
        })
    }
}

fn period_id(seconds: i64) -> PeriodId {
    PeriodId::new(Timestamp::from_unix_seconds(seconds))
}

fn identity(value: String) -> Result<Identity> {
    Identity::new(value).context("Stored identity is empty")
}

fn to_i64(value: u64, what: &str) -> Result<i64> {
    i64::try_from(value).with_context(|| format!("{what} {value} does not fit in SQLite INTEGER"))
}

fn to_u64(value: i64, what: &str) -> Result<u64> {
    u64::try_from(value).with_context(|| format!("Stored {what} {value} is negative"))
}
