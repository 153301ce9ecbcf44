//! `encrypt-vault` — encrypt a plaintext secrets file in place.
//!
//! Asks for a new password twice, encrypts the file with the configured
//! format and replaces it atomically.  No plaintext backup is kept.

use std::path::Path;

use tracing::{debug, info};

use crate::cli::output;
use crate::cli::prompt::{read_new_password, Prompter, TerminalPrompter};
use crate::cli::{Args, Session};
use crate::config::Settings;
use crate::crypto::{codec_for_new, CipherFormat};
use crate::errors::{VaultKitError, Result};
use crate::vault::{ensure_exists, read_secret_file, write_secret_file};

/// Execute the `encrypt-vault` command.
pub fn execute(args: &Args) -> Result<()> {
    let session = Session::from_args(args)?;
    let path = &session.path;

    output::info(&format!("Encrypting {}...", path.display()));
    run(path, &session.settings, &TerminalPrompter)?;

    output::success(&format!("Successfully encrypted {}", path.display()));
    output::warning("Remember this password — you'll need it to run the playbook!");
    Ok(())
}

/// Encrypt `path` in place with a freshly chosen password.
pub fn run(path: &Path, settings: &Settings, prompter: &dyn Prompter) -> Result<()> {
    ensure_exists(path)?;

    // Password problems are reported before the file is read.
    let password = read_new_password(prompter)?;

    // Refuse to wrap an existing vault in a second layer.
    let plaintext = read_secret_file(path)?;
    if let Some(format) = CipherFormat::detect(&plaintext) {
        debug!(%format, "file already carries a vault header");
        return Err(VaultKitError::AlreadyEncrypted(path.to_path_buf()));
    }

    let codec = codec_for_new(settings)?;
    let ciphertext = codec.encrypt(&plaintext, password.as_bytes())?;
    drop(password);

    write_secret_file(path, &ciphertext)?;
    info!(format = %codec.format(), path = %path.display(), "encrypted secret file");
    Ok(())
}
