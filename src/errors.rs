use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in vaultkit.
#[derive(Debug, Error)]
pub enum VaultKitError {
    // --- Secret file errors ---
    #[error("{0} not found")]
    MissingFile(PathBuf),

    #[error("{0} is already encrypted")]
    AlreadyEncrypted(PathBuf),

    // --- Password errors ---
    #[error("Password cannot be empty")]
    EmptyPassword,

    #[error("Password mismatch — passwords do not match")]
    PasswordMismatch,

    // --- Crypto errors ---
    #[error("Decryption failed — wrong password or tampered vault data")]
    Authentication,

    #[error("Not a recognizable vault file: {0}")]
    Format(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Interaction errors ---
    #[error("Editor error: {0}")]
    EditorInvocation(String),

    #[error("Prompt failed: {0}")]
    Prompt(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VaultKitError {
    /// True for the errors a wrong password can produce.
    ///
    /// A wrong password and a corrupt blob are indistinguishable to the
    /// operator, so both get the same hint.
    pub fn is_decryption_failure(&self) -> bool {
        matches!(self, Self::Authentication | Self::Format(_))
    }
}

/// Convenience type alias for vaultkit results.
pub type Result<T> = std::result::Result<T, VaultKitError>;
