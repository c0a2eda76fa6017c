//! On-disk placement of the SQLite ledger.
//!
//! The ledger file holds every committed record version, so on Unix it must be
//! a regular file owned by the current user with mode 0o600. A newly created
//! parent directory is 0o700. An existing ledger owned by someone else is
//! refused outright instead of being silently opened.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::LedgerError;

const WAL_SIDECARS: [&str; 2] = ["-wal", "-shm"];

fn io_error(path: &Path, source: io::Error) -> LedgerError {
    LedgerError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Prepare the ledger file at `path` and open a connection to it.
pub(crate) fn open_ledger_db(path: &Path) -> Result<Connection, LedgerError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        create_private_dir(parent)?;
    }

    match fs::metadata(path) {
        Ok(metadata) => check_existing(path, &metadata)?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => create_private_file(path)?,
        Err(err) => return Err(io_error(path, err)),
    }

    Ok(Connection::open(path)?)
}

fn create_private_dir(dir: &Path) -> Result<(), LedgerError> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir).map_err(|e| io_error(dir, e))
}

fn create_private_file(path: &Path) -> Result<(), LedgerError> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    match options.open(path) {
        Ok(_) => Ok(()),
        // Lost a creation race; whoever won must still pass the checks.
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            let metadata = fs::metadata(path).map_err(|e| io_error(path, e))?;
            check_existing(path, &metadata)
        }
        Err(err) => Err(io_error(path, err)),
    }
}

fn check_existing(path: &Path, metadata: &fs::Metadata) -> Result<(), LedgerError> {
    if !metadata.is_file() {
        return Err(LedgerError::Unavailable {
            reason: format!("ledger path {} is not a regular file", path.display()),
        });
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::{MetadataExt, PermissionsExt};

        let our_uid = unsafe { libc::getuid() };
        if metadata.uid() != our_uid {
            return Err(LedgerError::Unavailable {
                reason: format!(
                    "ledger file {} is owned by uid {}, not the current user",
                    path.display(),
                    metadata.uid()
                ),
            });
        }

        if metadata.permissions().mode() & 0o077 != 0 {
            tracing::warn!(path = %path.display(), "Tightening ledger file permissions to 0600");
            for target in std::iter::once(path.to_path_buf()).chain(sidecars(path)) {
                if target.exists() {
                    fs::set_permissions(&target, fs::Permissions::from_mode(0o600))
                        .map_err(|e| io_error(&target, e))?;
                }
            }
        }
    }
    Ok(())
}

fn sidecars(path: &Path) -> impl Iterator<Item = PathBuf> + '_ {
    WAL_SIDECARS.into_iter().map(move |suffix| {
        let mut name = path.as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    })
}
