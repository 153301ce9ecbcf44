//! `view-vault` — print the decrypted contents of a vault file.
//!
//! The file on disk is never modified.

use std::path::Path;

use tracing::debug;
use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::prompt::{read_password, Prompter, TerminalPrompter};
use crate::cli::{Args, Session};
use crate::config::Settings;
use crate::crypto::codec_for_existing;
use crate::errors::Result;
use crate::vault::{ensure_exists, read_secret_file};

/// Execute the `view-vault` command.
pub fn execute(args: &Args) -> Result<()> {
    let session = Session::from_args(args)?;

    output::info(&format!("Viewing {}...", session.path.display()));
    let plaintext = run(&session.path, &session.settings, &TerminalPrompter)?;

    output::print_contents(&plaintext)?;
    Ok(())
}

/// Decrypt `path` and return its plaintext.
pub fn run(path: &Path, settings: &Settings, prompter: &dyn Prompter) -> Result<Zeroizing<Vec<u8>>> {
    ensure_exists(path)?;
    let password = read_password(prompter)?;

    let data = read_secret_file(path)?;
    let codec = codec_for_existing(&data, settings)?;
    let plaintext = codec.decrypt(&data, password.as_bytes())?;
    drop(password);

    debug!(format = %codec.format(), bytes = plaintext.len(), "decrypted secret file");
    Ok(plaintext)
}
