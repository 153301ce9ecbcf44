//! CLI module — Clap arguments, logging, output helpers, and the three
//! workflow commands shared by the `encrypt-vault`, `view-vault` and
//! `edit-vault` binaries.

pub mod commands;
pub mod editor;
pub mod output;
pub mod prompt;

use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches, Parser};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Settings;
use crate::errors::{VaultKitError, Result};

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "VAULTKIT_LOG";

/// Arguments shared by all three tools.
///
/// There is no password flag: passwords are only read
/// from the terminal.
#[derive(Parser, Debug)]
#[command(version)]
pub struct Args {
    /// Secret file (default: inventory/group_vars/all.vault.yml)
    #[arg(short, long, env = "VAULTKIT_FILE")]
    pub file: Option<PathBuf>,

    /// Config file (default: ./vaultkit.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print debug logs to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Which of the three binaries is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Encrypt,
    View,
    Edit,
}

impl Tool {
    pub fn name(self) -> &'static str {
        match self {
            Self::Encrypt => "encrypt-vault",
            Self::View => "view-vault",
            Self::Edit => "edit-vault",
        }
    }

    pub fn about(self) -> &'static str {
        match self {
            Self::Encrypt => "Encrypt a plaintext secrets file in place",
            Self::View => "Decrypt a vault file and print its contents",
            Self::Edit => "Decrypt a vault file into an editor and re-encrypt it on save",
        }
    }
}

impl Args {
    /// Parse `std::env::args` under the given tool's name.
    pub fn parse_for(tool: Tool) -> Self {
        let matches = Self::command()
            .name(tool.name())
            .bin_name(tool.name())
            .about(tool.about())
            .get_matches();
        Self::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
    }
}

/// Install the stderr `tracing` subscriber.
///
/// `--verbose` turns on debug logs for this crate; otherwise the filter
/// comes from `VAULTKIT_LOG` and defaults to warnings only.
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("vaultkit=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // A second init (e.g. in tests) is harmless.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).without_time())
        .try_init();
}

/// Print an error and, for decryption failures, the usual hint.
pub fn report_error(err: &VaultKitError) {
    output::error(&err.to_string());
    if err.is_decryption_failure() {
        output::tip("Most likely the password is incorrect.");
    }
}

/// Everything a command needs besides its prompts: the resolved secret
/// file and the loaded settings.
#[derive(Debug, Clone)]
pub struct Session {
    pub path: PathBuf,
    pub settings: Settings,
}

impl Session {
    /// Resolve settings and the secret file path from the CLI arguments.
    pub fn from_args(args: &Args) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let settings = match &args.config {
            Some(path) => Settings::load_file(&cwd.join(path))?,
            None => Settings::load(&cwd)?,
        };
        let path = settings.vault_path(&cwd, args.file.as_deref());
        Ok(Self { path, settings })
    }
}
