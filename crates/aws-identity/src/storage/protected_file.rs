//! Owner-only file writes.
//!
//! Data is written to a sibling temporary file created with mode `0600`,
//! renamed into place, and the final path is restricted again so a file
//! that pre-existed with wider permissions is tightened on every save.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::error::Result;

/// Owner read/write, nothing for group or other.
pub const OWNER_READ_WRITE: u32 = 0o600;

/// Write `data` to `path` so that only the owner can read or write it.
///
/// The parent directory must already exist.
///
/// # Errors
///
/// Returns `IdentityError::Io` for any filesystem error.
pub fn write_protected(path: &Path, data: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension("json.tmp");

    {
        let mut file = open_private(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
    }
    restrict_permissions(&tmp_path)?;

    fs::rename(&tmp_path, path)?;
    restrict_permissions(path)?;

    Ok(())
}

#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(OWNER_READ_WRITE)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

/// Restrict `path` to owner read/write.
#[cfg(unix)]
pub fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(OWNER_READ_WRITE))
}

/// Restrict `path` to owner read/write.
///
/// Not supported off Unix; the file keeps its inherited ACL.
#[cfg(not(unix))]
pub fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}
