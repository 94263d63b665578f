//! JSON export of a ledger snapshot.

use std::path::Path;

use anyhow::{Context, Result};

use pension_core::LedgerSnapshot;

use crate::atomic_write::{AtomicWriteOptions, atomic_write_with_options, recover_bak_file};

/// Write `snapshot` to `path` as pretty-printed JSON, replacing any existing
/// file atomically.
pub fn export_snapshot(path: impl AsRef<Path>, snapshot: &LedgerSnapshot) -> Result<()> {
    let path = path.as_ref();
    recover_bak_file(path);

    let mut bytes =
        serde_json::to_vec_pretty(snapshot).context("Failed to serialize ledger snapshot")?;
    bytes.push(b'\n');
    let options = AtomicWriteOptions {
        dir_sync: true,
        ..AtomicWriteOptions::default()
    };
    atomic_write_with_options(path, &bytes, options)
        .with_context(|| format!("Failed to write export to {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        accounts = snapshot.accounts.len(),
        periods = snapshot.periods.len(),
        "Ledger exported"
    );
    Ok(())
}

/// Read a snapshot previously written by [`export_snapshot`].
pub fn read_export(path: impl AsRef<Path>) -> Result<LedgerSnapshot> {
    let path = path.as_ref();
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read export {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse export {}", path.display()))
}
