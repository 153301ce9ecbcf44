//! Temporary plaintext file for the edit workflow.
//!
//! A `ScratchFile` is created with a random name and owner-only
//! permissions.  Its contents are overwritten with zeros and the file is
//! removed when it is closed, or when it is dropped on any early return.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::{Builder, NamedTempFile, TempPath};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::errors::{VaultKitError, Result};

const PREFIX: &str = "vaultkit-";

/// Random characters in the file name.
const RAND_LEN: usize = 16;

pub struct ScratchFile {
    path: Option<TempPath>,
}

impl ScratchFile {
    /// Create a scratch file in the system temp directory.
    pub fn create(contents: &[u8], suffix: &str) -> Result<Self> {
        Self::create_in(&std::env::temp_dir(), contents, suffix)
    }

    /// Create a scratch file in `dir` holding `contents`.
    ///
    /// `suffix` (e.g. `.yml`) lets editors pick a syntax mode.
    pub fn create_in(dir: &Path, contents: &[u8], suffix: &str) -> Result<Self> {
        // tempfile opens with O_EXCL and mode 0600 on Unix.
        let mut file = Builder::new()
            .prefix(PREFIX)
            .suffix(suffix)
            .rand_bytes(RAND_LEN)
            .tempfile_in(dir)?;

        // From here on the file is removed on drop, even if writing fails.
        let write = fill(&mut file, contents);
        let path = file.into_temp_path();
        let scratch = Self { path: Some(path) };
        write?;

        debug!(path = %scratch.path().display(), bytes = contents.len(), "wrote scratch file");
        Ok(scratch)
    }

    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or(Path::new(""))
    }

    /// Read the (possibly edited) contents back.
    pub fn read(&self) -> Result<Zeroizing<Vec<u8>>> {
        let data = fs::read(self.path()).map_err(|e| {
            VaultKitError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read edited file: {e}"),
            ))
        })?;
        Ok(Zeroizing::new(data))
    }

    /// Wipe and delete the file, reporting a failed delete.
    pub fn close(mut self) -> Result<()> {
        match self.path.take() {
            Some(path) => {
                wipe(&path);
                path.close()?;
                debug!("removed scratch file");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            wipe(&path);
            if let Err(e) = path.close() {
                warn!("could not remove scratch file: {e}");
            }
        }
    }
}

fn fill(file: &mut NamedTempFile, contents: &[u8]) -> std::io::Result<()> {
    file.write_all(contents)?;
    file.flush()?;
    file.as_file().sync_all()
}

/// Overwrite a file's contents with zeros before it is deleted.
/// This reduces the chance of secret recovery from disk.
/// Best-effort: failures are ignored.
fn wipe(path: &Path) {
    if let Ok(metadata) = fs::metadata(path) {
        let len = metadata.len() as usize;
        if len > 0 {
            if let Ok(mut file) = fs::OpenOptions::new().write(true).open(path) {
                let zeros = vec![0u8; len];
                let _ = file.write_all(&zeros);
                let _ = file.sync_all();
            }
        }
    }
}
