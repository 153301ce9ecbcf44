//! `edit-vault` — open a vault file's plaintext in an editor.
//!
//! Decrypts to a private scratch file, launches `$EDITOR` / `$VISUAL` /
//! the configured editor, and after an explicit "yes" re-encrypts the
//! result over the original file.  The scratch file is wiped and removed
//! on every path, including errors.

use std::path::Path;

use tracing::{debug, info};

use crate::cli::editor::{find_editor, CommandEditor, Editor};
use crate::cli::output;
use crate::cli::prompt::{read_password, Prompter, TerminalPrompter};
use crate::cli::{Args, Session};
use crate::config::Settings;
use crate::crypto::codec_for_existing;
use crate::errors::Result;
use crate::vault::{ensure_exists, read_secret_file, write_secret_file, ScratchFile};

/// How an edit session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// Changes were re-encrypted into the secret file.
    Saved,
    /// The operator declined; the secret file was not touched.
    Discarded,
}

/// Execute the `edit-vault` command.
pub fn execute(args: &Args) -> Result<()> {
    let session = Session::from_args(args)?;
    let path = &session.path;
    let editor = CommandEditor::from_command_line(&find_editor(session.settings.editor.as_deref()))?;

    output::info(&format!("Editing {}...", path.display()));
    match run(path, &session.settings, &TerminalPrompter, &editor)? {
        EditOutcome::Saved => output::success(&format!("Successfully updated {}", path.display())),
        EditOutcome::Discarded => output::info("Changes discarded."),
    }
    Ok(())
}

/// Decrypt, edit, confirm and re-encrypt `path`.
pub fn run(
    path: &Path,
    settings: &Settings,
    prompter: &dyn Prompter,
    editor: &dyn Editor,
) -> Result<EditOutcome> {
    ensure_exists(path)?;
    let password = read_password(prompter)?;

    let data = read_secret_file(path)?;
    let codec = codec_for_existing(&data, settings)?;
    let plaintext = codec.decrypt(&data, password.as_bytes())?;
    debug!(format = %codec.format(), "decrypted secret file for editing");

    let scratch = ScratchFile::create(&plaintext, &scratch_suffix(path))?;
    output::info(&format!("Opening editor for {}...", scratch.path().display()));
    output::tip("Edit the file, save, and close the editor to continue.");

    // Any early return from here drops `scratch`, which wipes and deletes it.
    editor.edit(scratch.path())?;
    let edited = scratch.read()?;
    scratch.close()?;

    if *edited == *plaintext {
        output::info("No changes detected.");
    }

    if !prompter.confirm("Do you want to save the changes?")? {
        debug!("edit discarded by operator");
        return Ok(EditOutcome::Discarded);
    }

    // Same codec as the original file, fresh salt.
    let ciphertext = codec.encrypt(&edited, password.as_bytes())?;
    drop(password);

    write_secret_file(path, &ciphertext)?;
    info!(format = %codec.format(), path = %path.display(), "re-encrypted edited secret file");
    Ok(EditOutcome::Saved)
}

/// Keep the secret file's extension so editors pick the right syntax.
fn scratch_suffix(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_follows_extension() {
        assert_eq!(scratch_suffix(Path::new("inventory/group_vars/all.vault.yml")), ".yml");
        assert_eq!(scratch_suffix(Path::new("secrets")), "");
    }
}
