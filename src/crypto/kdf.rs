//! Password-based key derivation.
//!
//! Two schemes are supported:
//! - **PBKDF2-HMAC-SHA256**, fixed by the Ansible Vault 1.1 format
//!   (10 000 iterations, 80 bytes of output).
//! - **Argon2id**, a memory-hard KDF used by the sealed format.  Its
//!   parameters are configurable via `Argon2Params` (loaded from
//!   `vaultkit.toml` or sensible defaults) and stored inside each blob.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::errors::{VaultKitError, Result};

/// Length of the salt in bytes (256 bits).
pub const SALT_LEN: usize = 32;

/// Length of a derived AES-256 key in bytes.
pub const KEY_LEN: usize = 32;

/// Configurable Argon2id parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Params {
    /// Memory cost in KiB (default: 65 536 = 64 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 3).
    pub iterations: u32,
    /// Parallelism lanes (default: 4).
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

/// Minimum safe memory cost in KiB (8 MB).
pub const MIN_MEMORY_KIB: u32 = 8_192;

/// Largest memory cost we will write or run (1 GB).
///
/// Sealed blobs carry their own costs, so this also bounds what a
/// crafted file can make `view-vault` allocate.
pub const MAX_MEMORY_KIB: u32 = 1024 * 1024;

/// Upper bound for iterations and lanes.
pub const MAX_ITERATIONS: u32 = 16;
pub const MAX_PARALLELISM: u32 = 64;

impl Argon2Params {
    /// Reject parameters that are dangerously weak or absurdly expensive.
    pub fn validate(&self) -> Result<()> {
        if self.memory_kib < MIN_MEMORY_KIB || self.memory_kib > MAX_MEMORY_KIB {
            return Err(VaultKitError::KeyDerivationFailed(format!(
                "Argon2 memory_kib must be between {MIN_MEMORY_KIB} and {MAX_MEMORY_KIB} (got {})",
                self.memory_kib
            )));
        }
        if self.iterations < 1 || self.iterations > MAX_ITERATIONS {
            return Err(VaultKitError::KeyDerivationFailed(format!(
                "Argon2 iterations must be between 1 and {MAX_ITERATIONS} (got {})",
                self.iterations
            )));
        }
        if self.parallelism < 1 || self.parallelism > MAX_PARALLELISM {
            return Err(VaultKitError::KeyDerivationFailed(format!(
                "Argon2 parallelism must be between 1 and {MAX_PARALLELISM} (got {})",
                self.parallelism
            )));
        }
        Ok(())
    }
}

/// Derive a 32-byte key with explicit Argon2id parameters.
///
/// The same password + salt + params will always produce the same key.
pub fn derive_argon2_key(
    password: &[u8],
    salt: &[u8],
    argon2_params: &Argon2Params,
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    argon2_params.validate()?;

    let params = Params::new(
        argon2_params.memory_kib,
        argon2_params.iterations,
        argon2_params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| VaultKitError::KeyDerivationFailed(format!("invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(password, salt, key.as_mut())
        .map_err(|e| VaultKitError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}")))?;

    Ok(key)
}

/// Fill `out` with PBKDF2-HMAC-SHA256 output.
pub fn derive_pbkdf2(password: &[u8], salt: &[u8], iterations: u32, out: &mut [u8]) {
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, out);
}

/// Generate a cryptographically random 32-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}
