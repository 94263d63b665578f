//! `pension`: command-line front end for the pooled pension ledger.
//!
//! Every invocation loads the stored ledger (or starts a fresh one whose
//! first period opens now), runs one operation, persists the result and
//! prints a plain-text report on stdout. Logs go to a file so they never
//! interleave with command output.

mod commands;

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::PathBuf,
    sync::Mutex,
};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use pension_config::{PensionConfig, pension_dir};
use pension_core::{Enrollment, Ledger};
use pension_store::LedgerStore;
use pension_types::{AccountId, BiologicalSex, EmptyIdentityError, Identity, PeriodId, Timestamp};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_pension_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::debug!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // No log file: stay silent rather than mix logs into stdout.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_pension_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in pension_log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new().create(true).append(true).open(&candidate) {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn pension_log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.pension/logs/pension.log
    if let Some(dir) = pension_dir() {
        candidates.push(dir.join("logs").join("pension.log"));
    }

    // Fallback: ./.pension/logs/pension.log
    candidates.push(PathBuf::from(".pension").join("logs").join("pension.log"));

    candidates
}

#[derive(Parser)]
#[command(name = "pension", version)]
#[command(about = "Pooled pension ledger: accounts, contributions and cutoff periods")]
struct Cli {
    /// Config file (default: $PENSION_CONFIG or ~/.pension/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Ledger database, overriding [storage] path from the config
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,
    /// Operation instant in unix seconds (default: the current time)
    #[arg(long, global = true, value_name = "UNIX_SECONDS", allow_negative_numbers = true)]
    at: Option<i64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open an account and record its first contribution
    Mint {
        /// Caller identity that will own the account
        #[arg(long = "as", value_name = "IDENTITY", value_parser = parse_identity)]
        identity: Identity,
        /// female, male or other
        #[arg(long)]
        sex: BiologicalSex,
        /// Declared age in years
        #[arg(long)]
        age: u32,
        #[arg(long, allow_negative_numbers = true)]
        birth_year: i32,
        /// Opening contribution in the smallest currency unit
        #[arg(long)]
        amount: u64,
    },
    /// Add a contribution to an account you own
    Deposit {
        #[arg(long = "as", value_name = "IDENTITY", value_parser = parse_identity)]
        identity: Identity,
        #[arg(long, value_name = "ID")]
        account: u64,
        #[arg(long)]
        amount: u64,
    },
    /// Close the open period and file newly eligible retirees
    Advance,
    /// Current period, pool totals and account count
    Status,
    /// Balance summary of one account
    Account {
        id: u64,
    },
    /// Contribution bucket of one period
    Period {
        /// Period id (its opening instant in unix seconds)
        #[arg(allow_negative_numbers = true)]
        id: i64,
    },
    /// Retirement record of one period
    Retirees {
        #[arg(allow_negative_numbers = true)]
        id: i64,
    },
    /// Every period, oldest first
    Periods,
    /// Write the ledger as JSON
    Export {
        path: PathBuf,
    },
}

fn parse_identity(value: &str) -> Result<Identity, EmptyIdentityError> {
    Identity::new(value)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let result = run(cli);
    if let Err(err) = &result {
        tracing::error!("{err:#}");
    }
    result
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => PensionConfig::load_from(path)?,
        None => PensionConfig::load()?,
    };
    let resolved = config.resolve()?;
    let db_path = cli.db.unwrap_or(resolved.db_path);
    let now = cli
        .at
        .map_or_else(|| Timestamp::from_datetime(Utc::now()), Timestamp::from_unix_seconds);

    let mut store = LedgerStore::open(&db_path)?;
    let (mut ledger, fresh) = match store.load()? {
        Some(snapshot) => (
            Ledger::restore(resolved.rules, snapshot).with_context(|| {
                format!("Stored ledger at {} failed validation", db_path.display())
            })?,
            false,
        ),
        None => {
            tracing::info!(path = %db_path.display(), genesis = %now, "Starting a new ledger");
            (Ledger::new(resolved.rules, now), true)
        }
    };

    // The report is only shown once the change it describes is durable.
    let mut report = Vec::new();
    let changed = execute(cli.command, &mut ledger, now, &mut report)?;
    if changed || fresh {
        store.save(&ledger.snapshot())?;
    }

    let mut out = io::stdout().lock();
    out.write_all(&report)
        .and_then(|()| out.flush())
        .context("Failed to write report to stdout")?;
    Ok(())
}

/// Run one command against `ledger`. Returns whether the ledger changed.
fn execute(
    command: Command,
    ledger: &mut Ledger,
    now: Timestamp,
    out: &mut impl Write,
) -> Result<bool> {
    match command {
        Command::Mint {
            identity,
            sex,
            age,
            birth_year,
            amount,
        } => {
            let enrollment = Enrollment {
                identity,
                biological_sex: sex,
                age,
                birth_year,
                contribution: amount,
            };
            commands::mint(ledger, enrollment, now, out)?;
            Ok(true)
        }
        Command::Deposit {
            identity,
            account,
            amount,
        } => {
            commands::deposit(ledger, AccountId::new(account), &identity, amount, out)?;
            Ok(true)
        }
        Command::Advance => {
            commands::advance(ledger, now, out)?;
            Ok(true)
        }
        Command::Status => commands::status(ledger, out).map(|()| false),
        Command::Account { id } => {
            commands::account(ledger, AccountId::new(id), out).map(|()| false)
        }
        Command::Period { id } => commands::period(ledger, period_id(id), out).map(|()| false),
        Command::Retirees { id } => commands::retirees(ledger, period_id(id), out).map(|()| false),
        Command::Periods => commands::periods(ledger, out).map(|()| false),
        Command::Export { path } => commands::export(ledger, &path, out).map(|()| false),
    }
}

fn period_id(seconds: i64) -> PeriodId {
    PeriodId::new(Timestamp::from_unix_seconds(seconds))
}
