//! Cryptographic codecs for vault files.
//!
//! This module provides:
//! - The `Codec` capability the workflows encrypt and decrypt through
//! - Ansible Vault 1.1 / 1.2 envelopes (`ansible`), the default
//! - Argon2id + AES-256-GCM sealed envelopes (`sealed`)
//! - AES-256-GCM encryption and decryption (`encryption`)
//! - PBKDF2 and Argon2id password-based key derivation (`kdf`)

pub mod ansible;
pub mod encryption;
pub mod kdf;
pub mod sealed;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{VaultKitError, Result};

pub use ansible::AnsibleVaultCodec;
pub use kdf::Argon2Params;
pub use sealed::SealedCodec;

/// Password-based authenticated encryption of a whole file.
///
/// `encrypt` uses a fresh salt on every call, so encrypting the same
/// plaintext twice never yields the same bytes.  `decrypt` returns
/// `Authentication` for a wrong password or tampered data and `Format`
/// for bytes that are not this codec's envelope.
pub trait Codec {
    fn format(&self) -> CipherFormat;

    fn encrypt(&self, plaintext: &[u8], password: &[u8]) -> Result<Vec<u8>>;

    fn decrypt(&self, ciphertext: &[u8], password: &[u8]) -> Result<Zeroizing<Vec<u8>>>;
}

/// The envelope formats vaultkit can read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherFormat {
    /// `$ANSIBLE_VAULT;1.1;AES256`
    #[default]
    Ansible,
    /// `$VAULTKIT;1;ARGON2ID-AES256GCM`
    Sealed,
}

impl CipherFormat {
    /// Identify an encrypted file from its leading bytes.
    ///
    /// Returns `None` for anything that does not start with a known
    /// header, i.e. a plaintext file.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(ansible::MAGIC.as_bytes()) {
            Some(Self::Ansible)
        } else if data.starts_with(sealed::MAGIC.as_bytes()) {
            Some(Self::Sealed)
        } else {
            None
        }
    }
}

impl fmt::Display for CipherFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ansible => f.write_str("ansible"),
            Self::Sealed => f.write_str("sealed"),
        }
    }
}

impl FromStr for CipherFormat {
    type Err = VaultKitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ansible" => Ok(Self::Ansible),
            "sealed" => Ok(Self::Sealed),
            other => Err(VaultKitError::ConfigError(format!(
                "unknown vault format '{other}' (expected 'ansible' or 'sealed')"
            ))),
        }
    }
}

/// Build the codec used to encrypt a plaintext file.
pub fn codec_for_new(settings: &Settings) -> Result<Box<dyn Codec>> {
    match settings.format {
        CipherFormat::Ansible => Ok(Box::new(AnsibleVaultCodec::with_vault_id(
            settings.vault_id.as_deref(),
        )?)),
        CipherFormat::Sealed => Ok(Box::new(SealedCodec::new(settings.argon2_params())?)),
    }
}

/// Build the codec matching an already encrypted file.
///
/// An Ansible vault id found in the header is carried over so that
/// re-encrypting after an edit keeps the label.
pub fn codec_for_existing(data: &[u8], settings: &Settings) -> Result<Box<dyn Codec>> {
    match CipherFormat::detect(data) {
        Some(CipherFormat::Ansible) => {
            let header = ansible::read_header(data)?;
            Ok(Box::new(AnsibleVaultCodec::with_vault_id(
                header.vault_id.as_deref(),
            )?))
        }
        Some(CipherFormat::Sealed) => Ok(Box::new(SealedCodec::new(settings.argon2_params())?)),
        None => Err(VaultKitError::Format(
            "file does not start with a vault header (is it encrypted?)".into(),
        )),
    }
}

/// Split an armored file into its header line and its joined body.
///
/// Lines end in `\n`.  A `\r` is dropped only directly before a `\n`, so
/// any other stray byte survives into the body and fails decoding.
pub(crate) fn split_armor(data: &[u8]) -> Result<(&[u8], Vec<u8>)> {
    let mut lines = data.split(|&b| b == b'\n');
    let header = lines.next().unwrap_or_default();

    let mut rest: Vec<&[u8]> = lines.collect();
    // The piece after the final newline has no line ending to strip.
    let last = rest.pop().unwrap_or_default();

    let mut body = Vec::with_capacity(data.len());
    for line in rest {
        body.extend_from_slice(line.strip_suffix(b"\r").unwrap_or(line));
    }
    body.extend_from_slice(last);

    if body.is_empty() {
        return Err(VaultKitError::Format("vault body is empty".into()));
    }
    Ok((header, body))
}
