//! Project configuration (`vaultkit.toml`).

pub mod settings;

pub use settings::{Settings, DEFAULT_VAULT_FILE};
