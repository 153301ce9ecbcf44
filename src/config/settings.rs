use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::{Argon2Params, CipherFormat};
use crate::errors::{VaultKitError, Result};

/// Secret file used when neither the CLI nor the config names one.
pub const DEFAULT_VAULT_FILE: &str = "inventory/group_vars/all.vault.yml";

/// Project-level configuration, loaded from `vaultkit.toml`.
///
/// Every field has a sensible default so the tools work out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Secret file path (relative to the working directory).
    #[serde(default = "default_vault_file")]
    pub vault_file: PathBuf,

    /// Envelope written by `encrypt-vault`: "ansible" or "sealed".
    #[serde(default)]
    pub format: CipherFormat,

    /// Ansible vault id label; writes a `1.2` header when set.
    #[serde(default)]
    pub vault_id: Option<String>,

    /// Editor used when neither `EDITOR` nor `VISUAL` is set.
    #[serde(default)]
    pub editor: Option<String>,

    /// Argon2 memory cost in KiB for sealed files (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count for sealed files (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree for sealed files (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault_file() -> PathBuf {
    PathBuf::from(DEFAULT_VAULT_FILE)
}

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_file: default_vault_file(),
            format: CipherFormat::default(),
            vault_id: None,
            editor: None,
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the working directory.
    pub const FILE_NAME: &'static str = "vaultkit.toml";

    /// Load settings from `<project_dir>/vaultkit.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_file(&config_path)
    }

    /// Load settings from an explicit file, which must exist.
    pub fn load_file(config_path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(config_path).map_err(|e| {
            VaultKitError::ConfigError(format!("cannot read {}: {e}", config_path.display()))
        })?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultKitError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Resolve the secret file against `project_dir`.
    ///
    /// `override_path` (from `--file` / `VAULTKIT_FILE`) wins over the
    /// configured `vault_file`.  Absolute paths are returned unchanged.
    pub fn vault_path(&self, project_dir: &Path, override_path: Option<&Path>) -> PathBuf {
        let path = override_path.unwrap_or(self.vault_file.as_path());
        project_dir.join(path)
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
