//! Interactive prompts.
//!
//! Workflows talk to a `Prompter` so they can run against a terminal in
//! the binaries and against scripted answers in tests.  Passwords are only
//! ever read here: there is no flag or environment variable
//! that supplies one.

use zeroize::Zeroizing;

use crate::errors::{VaultKitError, Result};

pub trait Prompter {
    /// Read a secret without echoing it.
    fn password(&self, prompt: &str) -> Result<Zeroizing<String>>;

    /// Ask a yes/no question.  Anything but an explicit yes is "no".
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// `dialoguer`-backed prompts on the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn password(&self, prompt: &str) -> Result<Zeroizing<String>> {
        // Blank input is accepted here and rejected with a clear error
        // by `read_password`, instead of dialoguer re-prompting.
        let pw = dialoguer::Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .map_err(|e| VaultKitError::Prompt(format!("password prompt: {e}")))?;
        Ok(Zeroizing::new(pw))
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| VaultKitError::Prompt(format!("confirmation prompt: {e}")))
    }
}

/// Ask once for the password of an existing vault.
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn read_password(prompter: &dyn Prompter) -> Result<Zeroizing<String>> {
    let password = prompter.password("Enter vault password")?;
    if password.is_empty() {
        return Err(VaultKitError::EmptyPassword);
    }
    Ok(password)
}

/// Ask for a new password and its confirmation.
///
/// A mismatch is an error, not a retry: the operator simply re-runs.
pub fn read_new_password(prompter: &dyn Prompter) -> Result<Zeroizing<String>> {
    let password = prompter.password("Enter a vault password (it will not be displayed)")?;
    if password.is_empty() {
        return Err(VaultKitError::EmptyPassword);
    }

    let confirmation = prompter.password("Confirm password")?;
    if *password != *confirmation {
        return Err(VaultKitError::PasswordMismatch);
    }
    Ok(password)
}
