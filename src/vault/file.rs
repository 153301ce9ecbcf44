//! Reading and replacing the secret file.
//!
//! The secret file is always replaced **atomically**: new bytes go to a
//! temp file in the same directory, are synced, and are then renamed over
//! the target.  Readers never see a half-written vault, and a crash
//! mid-write leaves the old file in place.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;
use zeroize::Zeroizing;

use crate::errors::{VaultKitError, Result};

/// Fail with `MissingFile` unless `path` is an existing file.
pub fn ensure_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(VaultKitError::MissingFile(path.to_path_buf()))
    }
}

/// Read the whole secret file.
///
/// The buffer is wiped on drop because it may hold plaintext.
pub fn read_secret_file(path: &Path) -> Result<Zeroizing<Vec<u8>>> {
    ensure_exists(path)?;
    let data = Zeroizing::new(fs::read(path)?);
    debug!(path = %path.display(), bytes = data.len(), "read secret file");
    Ok(data)
}

/// Replace the secret file with `contents`, keeping its permissions.
pub fn write_secret_file(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let permissions = fs::metadata(path).ok().map(|m| m.permissions());

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    if let Some(perms) = permissions {
        tmp.as_file().set_permissions(perms)?;
    }

    tmp.persist(path).map_err(|e| VaultKitError::Io(e.error))?;
    debug!(path = %path.display(), bytes = contents.len(), "replaced secret file");
    Ok(())
}
