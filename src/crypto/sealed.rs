//! vaultkit's own envelope: Argon2id + AES-256-GCM.
//!
//! ```text
//! $VAULTKIT;1;ARGON2ID-AES256GCM
//! <base64 payload, 76 columns per line>
//! ```
//!
//! Payload layout:
//!
//! ```text
//! [salt: 32][memory_kib: u32 LE][iterations: u32 LE][parallelism: u32 LE][nonce: 12][ciphertext + tag]
//! ```
//!
//! The header line and the parameter block are authenticated as
//! associated data, and the Argon2 parameters are read back from the
//! payload so a file always opens with the cost it was sealed with.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use zeroize::Zeroizing;

use super::encryption::{self, NONCE_LEN, TAG_LEN};
use super::kdf::{derive_argon2_key, generate_salt, Argon2Params, SALT_LEN};
use super::{split_armor, CipherFormat, Codec};
use crate::errors::{VaultKitError, Result};

/// First field of every sealed header.
pub const MAGIC: &str = "$VAULTKIT";

/// Full header line written by this version.
const HEADER: &str = "$VAULTKIT;1;ARGON2ID-AES256GCM";

/// Three little-endian u32 values.
const PARAMS_LEN: usize = 12;

const LINE_WIDTH: usize = 76;

/// Codec for sealed files.  `params` only affects encryption.
#[derive(Debug, Clone)]
pub struct SealedCodec {
    params: Argon2Params,
}

impl SealedCodec {
    pub fn new(params: Argon2Params) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }
}

impl Codec for SealedCodec {
    fn format(&self) -> CipherFormat {
        CipherFormat::Sealed
    }

    fn encrypt(&self, plaintext: &[u8], password: &[u8]) -> Result<Vec<u8>> {
        let salt = generate_salt();
        let params = encode_params(&self.params);
        let key = derive_argon2_key(password, &salt, &self.params)?;

        let sealed = encryption::encrypt(key.as_ref(), plaintext, &associated_data(&params))?;

        let mut payload = Vec::with_capacity(SALT_LEN + PARAMS_LEN + sealed.len());
        payload.extend_from_slice(&salt);
        payload.extend_from_slice(&params);
        payload.extend_from_slice(&sealed);

        let body = BASE64.encode(&payload);
        let mut out = HEADER.as_bytes().to_vec();
        out.push(b'\n');
        for line in body.as_bytes().chunks(LINE_WIDTH) {
            out.extend_from_slice(line);
            out.push(b'\n');
        }
        Ok(out)
    }

    fn decrypt(&self, ciphertext: &[u8], password: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let (header, body) = split_armor(ciphertext)?;
        let header = header.strip_suffix(b"\r").unwrap_or(header);
        if header != HEADER.as_bytes() {
            return Err(VaultKitError::Format("unsupported sealed header".into()));
        }

        let payload = BASE64
            .decode(&body)
            .map_err(|e| VaultKitError::Format(format!("body is not base64: {e}")))?;
        if payload.len() < SALT_LEN + PARAMS_LEN + NONCE_LEN + TAG_LEN {
            return Err(VaultKitError::Format("sealed payload is truncated".into()));
        }

        let (salt, rest) = payload.split_at(SALT_LEN);
        let (params_bytes, sealed) = rest.split_at(PARAMS_LEN);
        let params = decode_params(params_bytes)?;

        let key = derive_argon2_key(password, salt, &params)?;
        encryption::decrypt(key.as_ref(), sealed, &associated_data(params_bytes))
    }
}

fn associated_data(params: &[u8]) -> Vec<u8> {
    let mut aad = HEADER.as_bytes().to_vec();
    aad.extend_from_slice(params);
    aad
}

fn encode_params(params: &Argon2Params) -> [u8; PARAMS_LEN] {
    let mut out = [0u8; PARAMS_LEN];
    out[0..4].copy_from_slice(&params.memory_kib.to_le_bytes());
    out[4..8].copy_from_slice(&params.iterations.to_le_bytes());
    out[8..12].copy_from_slice(&params.parallelism.to_le_bytes());
    out
}

fn decode_params(bytes: &[u8]) -> Result<Argon2Params> {
    let word = |i: usize| -> Result<u32> {
        bytes
            .get(i..i + 4)
            .and_then(|b| b.try_into().ok())
            .map(u32::from_le_bytes)
            .ok_or_else(|| VaultKitError::Format("sealed parameters are truncated".into()))
    };

    let params = Argon2Params {
        memory_kib: word(0)?,
        iterations: word(4)?,
        parallelism: word(8)?,
    };
    // Out-of-range costs can only come from corruption; never run them.
    params
        .validate()
        .map_err(|e| VaultKitError::Format(format!("sealed parameters rejected: {e}")))?;
    Ok(params)
}
