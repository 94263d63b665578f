//! Owner-only permissions for the ledger database.
//!
//! The database holds participant identities. On Unix its directory ends up
//! 0o700 and the database file plus the WAL/SHM sidecars 0o600. The sidecars
//! only exist once the connection is in WAL mode, so they are tightened in a
//! second step after the journal mode is set.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Files SQLite keeps next to a database in WAL mode.
const WAL_SIDECARS: [&str; 2] = ["-wal", "-shm"];

/// Open the database at `path`, creating it and its directory owner-only.
///
/// Call [`tighten_sidecars`] once WAL mode is enabled on the connection.
pub(crate) fn open_owner_only(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        #[cfg(unix)]
        restrict_owned_dir(parent)?;
    }

    let mut options = OpenOptions::new();
    options.create(true).truncate(false).read(true).write(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
        .open(path)
        .with_context(|| format!("Failed to create database file: {}", path.display()))?;
    #[cfg(unix)]
    restrict_file(path)?;

    Connection::open(path).with_context(|| format!("Failed to open database at {}", path.display()))
}

/// Restrict the WAL sidecars of the database at `path` to the owner.
pub(crate) fn tighten_sidecars(path: &Path) -> Result<()> {
    for sidecar in WAL_SIDECARS.iter().map(|suffix| sidecar_path(path, suffix)) {
        if !sidecar.exists() {
            continue;
        }
        #[cfg(unix)]
        restrict_file(&sidecar)?;
    }
    Ok(())
}

fn sidecar_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or(path.as_os_str()).to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

/// Drop group/other access on a directory we own; leave shared ones alone.
#[cfg(unix)]
fn restrict_owned_dir(path: &Path) -> Result<()> {
    use std::os::unix::fs::{MetadataExt, PermissionsExt};

    let metadata = fs::metadata(path)
        .with_context(|| format!("Failed to read directory metadata: {}", path.display()))?;
    let owned = metadata.uid() == unsafe { libc::getuid() };
    if owned && metadata.permissions().mode() & 0o077 != 0 {
        fs::set_permissions(path, fs::Permissions::from_mode(0o700))
            .with_context(|| format!("Failed to set directory permissions: {}", path.display()))?;
    }
    Ok(())
}

#[cfg(unix)]
fn restrict_file(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("Failed to set permissions on {}", path.display()))
}
