//! Launching the operator's text editor.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::errors::{VaultKitError, Result};

/// Something that lets the operator modify a file in place and returns
/// once they are done.
pub trait Editor {
    fn edit(&self, path: &Path) -> Result<()>;
}

/// Editor used when nothing else is configured.
#[cfg(windows)]
pub const DEFAULT_EDITOR: &str = "notepad";
#[cfg(not(windows))]
pub const DEFAULT_EDITOR: &str = "vi";

/// Choose an editor command line.
///
/// Order: `EDITOR`, `VISUAL`, the `editor` config entry, then the platform
/// default.  Blank values are skipped.
pub fn pick_editor(
    editor_env: Option<String>,
    visual_env: Option<String>,
    configured: Option<&str>,
) -> String {
    [editor_env, visual_env, configured.map(str::to_string)]
        .into_iter()
        .flatten()
        .find(|e| !e.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EDITOR.to_string())
}

/// Find the user's preferred editor from the environment and config.
pub fn find_editor(configured: Option<&str>) -> String {
    pick_editor(
        std::env::var("EDITOR").ok(),
        std::env::var("VISUAL").ok(),
        configured,
    )
}

/// Runs an external program and blocks until it exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEditor {
    program: String,
    args: Vec<String>,
}

impl CommandEditor {
    /// Split an editor command line such as `code --wait` on whitespace.
    ///
    /// A value that names an existing file is taken whole, so paths like
    /// `C:\Program Files\Notepad++\notepad++.exe` keep their spaces.
    pub fn from_command_line(command: &str) -> Result<Self> {
        let trimmed = command.trim();
        if trimmed.contains(char::is_whitespace) && Path::new(trimmed).is_file() {
            return Ok(Self {
                program: trimmed.to_string(),
                args: Vec::new(),
            });
        }

        let mut words = command.split_whitespace().map(str::to_string);
        let program = words
            .next()
            .ok_or_else(|| VaultKitError::EditorInvocation("editor command is empty".into()))?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Editor for CommandEditor {
    fn edit(&self, path: &Path) -> Result<()> {
        debug!(program = %self.program, "launching editor");
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .status()
            .map_err(|e| {
                VaultKitError::EditorInvocation(format!("failed to launch '{}': {e}", self.program))
            })?;

        if !status.success() {
            return Err(VaultKitError::EditorInvocation(match status.code() {
                Some(code) => format!("editor exited with code {code}"),
                None => "editor was terminated by a signal".to_string(),
            }));
        }
        Ok(())
    }
}
