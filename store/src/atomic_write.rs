//! Atomic file write helpers.
//!
//! Uses a temp file + rename pattern. Where rename-over-existing fails, the
//! old file is moved to `.bak` first and restored if the rename still fails.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

#[derive(Debug, Clone, Copy)]
pub(crate) struct AtomicWriteOptions {
    /// When true, `sync_all()` is called on the temp file before persisting.
    pub(crate) sync_all: bool,
    /// Best-effort `sync_all()` on the parent directory after the rename.
    pub(crate) dir_sync: bool,
    /// When set (Unix only), applied to the temp file before writing and to
    /// the final file after persist.
    pub(crate) unix_mode: Option<u32>,
}

impl Default for AtomicWriteOptions {
    fn default() -> Self {
        Self {
            sync_all: true,
            dir_sync: false,
            unix_mode: Some(0o600),
        }
    }
}

/// Recover from an interrupted overwrite by restoring `path.bak`.
///
/// If `path` is missing but its backup exists, a crash happened between
/// moving the old file aside and renaming the new one into place.
pub(crate) fn recover_bak_file(path: &Path) {
    let backup = path.with_extension("bak");
    if !path.exists() && backup.exists() {
        match fs::rename(&backup, path) {
            Ok(()) => {
                tracing::warn!(
                    path = %path.display(),
                    "Recovered .bak file from interrupted atomic write"
                );
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "Failed to recover .bak file: {e}");
            }
        }
    }
}

pub(crate) fn atomic_write_with_options(
    path: impl AsRef<Path>,
    bytes: &[u8],
    options: AtomicWriteOptions,
) -> io::Result<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent)?;
    #[cfg(unix)]
    if let Some(mode) = options.unix_mode {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(mode))?;
    }

    tmp.write_all(bytes)?;
    if options.sync_all {
        tmp.as_file().sync_all()?;
    }

    if let Err(err) = tmp.persist(path) {
        if !path.exists() {
            return Err(err.error);
        }
        let backup_path = path.with_extension("bak");
        let _ = fs::remove_file(&backup_path);
        fs::rename(path, &backup_path)?;

        if let Err(rename_err) = err.file.persist(path) {
            let _ = fs::rename(&backup_path, path);
            return Err(rename_err.error);
        }
        if let Err(e) = fs::remove_file(&backup_path) {
            tracing::warn!(
                path = %backup_path.display(),
                "Failed to remove .bak after atomic write: {e}"
            );
        }
    }

    #[cfg(unix)]
    if let Some(mode) = options.unix_mode {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }

    if options.dir_sync
        && let Err(e) = File::open(parent).and_then(|dir| dir.sync_all())
    {
        tracing::debug!(path = %parent.display(), "Parent directory sync_all failed (best-effort): {e}");
    }

    Ok(())
}
