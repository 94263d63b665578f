//! Command handlers and their plain-text reports.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use pension_core::{Enrollment, Ledger};
use pension_store::export_snapshot;
use pension_types::{AccountId, Amount, Identity, PeriodId, Timestamp};

pub(crate) fn mint(
    ledger: &mut Ledger,
    enrollment: Enrollment,
    now: Timestamp,
    out: &mut impl Write,
) -> Result<()> {
    let id = ledger.mint(enrollment, now)?;
    let account = ledger.query_account(id)?;
    writeln!(
        out,
        "minted account {id} in period {}",
        ledger.current_cutoff()
    )?;
    writeln!(out, "  retirement at  {}", account.retirement_at)?;
    write_split(
        out,
        account.cumulative_contribution,
        account.cumulative_savings,
        account.cumulative_solidarity,
    )
}

pub(crate) fn deposit(
    ledger: &mut Ledger,
    account_id: AccountId,
    identity: &Identity,
    amount: Amount,
    out: &mut impl Write,
) -> Result<()> {
    ledger.deposit(account_id, identity, amount)?;
    let account = ledger.query_account(account_id)?;
    writeln!(
        out,
        "deposited {amount} into account {account_id} in period {}",
        ledger.current_cutoff()
    )?;
    write_split(
        out,
        account.cumulative_contribution,
        account.cumulative_savings,
        account.cumulative_solidarity,
    )
}

pub(crate) fn advance(ledger: &mut Ledger, now: Timestamp, out: &mut impl Write) -> Result<()> {
    let report = ledger.advance_cutoff(now)?;
    writeln!(out, "closed period {}", report.closed)?;
    writeln!(out, "opened period {}", report.opened)?;
    if report.retirees.is_empty() {
        writeln!(out, "no new retirees")?;
    } else {
        for entry in ledger.retirement_record(report.closed)? {
            writeln!(out, "retired account {} ({})", entry.account_id, entry.owner)?;
        }
    }
    Ok(())
}

pub(crate) fn status(ledger: &Ledger, out: &mut impl Write) -> Result<()> {
    let current = ledger.current_cutoff();
    let totals = ledger.pool_totals();
    let rules = ledger.rules();

    writeln!(out, "current period  {current} ({})", current.opened_at())?;
    writeln!(out, "periods         {}", ledger.periods().count())?;
    writeln!(out, "accounts        {}", ledger.accounts().count())?;
    writeln!(
        out,
        "retired         {}",
        ledger.accounts().filter(|account| account.is_retired()).count()
    )?;
    writeln!(out, "contributions   {}", totals.contributions)?;
    writeln!(out, "savings         {}", totals.savings)?;
    writeln!(out, "solidarity      {}", totals.solidarity)?;
    writeln!(
        out,
        "rules           minimum contribution {}, minimum age {}, retirement age {} years",
        rules.minimum_contribution(),
        rules.minimum_age(),
        rules.retirement_age_years()
    )?;
    Ok(())
}

pub(crate) fn account(ledger: &Ledger, account_id: AccountId, out: &mut impl Write) -> Result<()> {
    let account = ledger.query_account(account_id)?;
    let balance = account.balance();

    writeln!(out, "account {account_id}")?;
    writeln!(out, "  owner          {}", account.owner)?;
    writeln!(out, "  sex            {}", account.biological_sex)?;
    writeln!(out, "  birth year     {}", account.birth_year)?;
    writeln!(out, "  age            {}", balance.age)?;
    writeln!(out, "  created at     {}", balance.created_at)?;
    writeln!(out, "  retirement at  {}", balance.retirement_at)?;
    match balance.retired_in {
        Some(period) => writeln!(out, "  retired in     {period}")?,
        None => writeln!(out, "  retired in     -")?,
    }
    write_split(
        out,
        balance.cumulative_contribution,
        balance.total_savings,
        balance.total_solidary,
    )
}

pub(crate) fn period(ledger: &Ledger, period: PeriodId, out: &mut impl Write) -> Result<()> {
    let record = ledger.query_period(period)?;

    writeln!(out, "period {period} ({})", period.opened_at())?;
    match record.closed_at {
        Some(closed_at) => writeln!(out, "  closed at  {closed_at}")?,
        None => writeln!(out, "  open")?,
    }
    for entry in &record.contributions {
        writeln!(out, "  account {:>6}  {}", entry.account_id, entry.amount)?;
    }
    writeln!(out, "  total  {}", ledger.period_total(period)?)?;
    Ok(())
}

pub(crate) fn retirees(ledger: &Ledger, period: PeriodId, out: &mut impl Write) -> Result<()> {
    let record = ledger.retirement_record(period)?;
    if record.is_empty() {
        writeln!(out, "no retirees filed in period {period}")?;
        return Ok(());
    }
    for entry in record {
        writeln!(out, "account {}  {}", entry.account_id, entry.owner)?;
    }
    Ok(())
}

pub(crate) fn periods(ledger: &Ledger, out: &mut impl Write) -> Result<()> {
    for record in ledger.periods() {
        let state = match record.closed_at {
            Some(closed_at) => format!("closed {closed_at}"),
            None => "open".to_string(),
        };
        writeln!(
            out,
            "{}  {state}  contributions {}  total {}  retirees {}",
            record.id,
            record.contributions.len(),
            record.contribution_total(),
            record.retirees.len()
        )?;
    }
    Ok(())
}

pub(crate) fn export(ledger: &Ledger, path: &Path, out: &mut impl Write) -> Result<()> {
    export_snapshot(path, &ledger.snapshot())
        .with_context(|| format!("Export to {} failed", path.display()))?;
    writeln!(out, "exported ledger to {}", path.display())?;
    Ok(())
}

fn write_split(
    out: &mut impl Write,
    contribution: Amount,
    savings: Amount,
    solidarity: Amount,
) -> Result<()> {
    writeln!(out, "  contribution   {contribution}")?;
    writeln!(out, "  savings        {savings}")?;
    writeln!(out, "  solidarity     {solidarity}")?;
    Ok(())
}
