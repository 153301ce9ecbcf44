//! Ansible Vault 1.1 / 1.2 envelope (`AES256` cipher).
//!
//! A vault file looks like this:
//!
//! ```text
//! $ANSIBLE_VAULT;1.1;AES256
//! 3338363566363531643961353632393939623032633934643336353637316462...
//! ```
//!
//! Version `1.2` appends a vault-id label to the header
//! (`$ANSIBLE_VAULT;1.2;AES256;prod`).  The body is lowercase hex wrapped at
//! 80 columns and decodes to a second layer of text:
//!
//! ```text
//! hex(salt) \n hex(hmac) \n hex(ciphertext)
//! ```
//!
//! Keys come from PBKDF2-HMAC-SHA256 (10 000 iterations, 80 bytes):
//! `aes_key(32) | hmac_key(32) | ctr_iv(16)`.  The plaintext is PKCS#7
//! padded, encrypted with AES-256-CTR, and the HMAC-SHA256 of the
//! ciphertext is verified before anything is decrypted.

use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::kdf::{derive_pbkdf2, generate_salt, KEY_LEN};
use super::{split_armor, CipherFormat, Codec};
use crate::errors::{VaultKitError, Result};

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// First field of every vault header.
pub const MAGIC: &str = "$ANSIBLE_VAULT";

/// The only cipher Ansible still writes.
const CIPHER_NAME: &str = "AES256";

/// PBKDF2 iteration count fixed by the format.
const PBKDF2_ITERATIONS: u32 = 10_000;

/// aes key + hmac key + ctr iv.
const DERIVED_LEN: usize = KEY_LEN * 2 + IV_LEN;

const IV_LEN: usize = 16;
const BLOCK_LEN: usize = 16;
const HMAC_LEN: usize = 32;

/// Body line width used by `ansible-vault`.
const LINE_WIDTH: usize = 80;

/// The label Ansible treats as "no vault id".
const DEFAULT_VAULT_ID: &str = "default";

/// Parsed first line of a vault file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultHeader {
    pub version: String,
    pub vault_id: Option<String>,
}

/// Codec for Ansible Vault files.
#[derive(Debug, Clone, Default)]
pub struct AnsibleVaultCodec {
    vault_id: Option<String>,
}

impl AnsibleVaultCodec {
    /// A codec that writes plain `1.1` envelopes.
    pub fn new() -> Self {
        Self::default()
    }

    /// A codec that writes `1.2` envelopes labelled with `vault_id`.
    ///
    /// The label `default` is Ansible's "unlabelled" id and produces `1.1`.
    pub fn with_vault_id(vault_id: Option<&str>) -> Result<Self> {
        let vault_id = match vault_id {
            None => None,
            Some(id) if id == DEFAULT_VAULT_ID => None,
            Some(id) => {
                validate_vault_id(id)?;
                Some(id.to_string())
            }
        };
        Ok(Self { vault_id })
    }

    pub fn vault_id(&self) -> Option<&str> {
        self.vault_id.as_deref()
    }

    fn header_line(&self) -> String {
        match &self.vault_id {
            Some(id) => format!("{MAGIC};1.2;{CIPHER_NAME};{id}"),
            None => format!("{MAGIC};1.1;{CIPHER_NAME}"),
        }
    }

    /// Encrypt with a caller-chosen salt.  Only tests pin the salt.
    fn encrypt_with_salt(&self, plaintext: &[u8], password: &[u8], salt: &[u8]) -> Result<Vec<u8>> {
        let keys = DerivedKeys::derive(password, salt);

        let mut ciphertext = pkcs7_pad(plaintext);
        keys.apply_keystream(&mut ciphertext);

        let tag = keys.mac(&ciphertext)?.finalize().into_bytes();

        let inner = format!(
            "{}\n{}\n{}",
            hex::encode(salt),
            hex::encode(tag),
            hex::encode(&ciphertext)
        );
        let body = hex::encode(inner.as_bytes());

        let mut out = self.header_line().into_bytes();
        out.push(b'\n');
        for line in body.as_bytes().chunks(LINE_WIDTH) {
            out.extend_from_slice(line);
            out.push(b'\n');
        }
        Ok(out)
    }
}

impl Codec for AnsibleVaultCodec {
    fn format(&self) -> CipherFormat {
        CipherFormat::Ansible
    }

    fn encrypt(&self, plaintext: &[u8], password: &[u8]) -> Result<Vec<u8>> {
        let salt = generate_salt();
        self.encrypt_with_salt(plaintext, password, &salt)
    }

    fn decrypt(&self, ciphertext: &[u8], password: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let (header, body) = split_armor(ciphertext)?;
        parse_header(header)?;
        let parts = VaultBody::parse(&body)?;

        let keys = DerivedKeys::derive(password, &parts.salt);
        let expected = keys.mac(&parts.ciphertext)?.finalize().into_bytes();
        if !bool::from(expected.as_slice().ct_eq(&parts.hmac)) {
            return Err(VaultKitError::Authentication);
        }

        let mut plaintext = Zeroizing::new(parts.ciphertext);
        keys.apply_keystream(&mut plaintext);

        pkcs7_unpad(&mut plaintext)?;
        Ok(plaintext)
    }
}

/// Read the header of a vault file without touching the body.
pub fn read_header(data: &[u8]) -> Result<VaultHeader> {
    let line = match data.iter().position(|&b| b == b'\n') {
        Some(end) => &data[..end],
        None => data,
    };
    parse_header(line)
}

fn validate_vault_id(id: &str) -> Result<()> {
    if id.is_empty() || id.chars().any(|c| c == ';' || c.is_whitespace() || c.is_control()) {
        return Err(VaultKitError::ConfigError(format!(
            "vault id '{id}' is invalid — it must be non-empty without ';' or whitespace"
        )));
    }
    Ok(())
}

fn parse_header(line: &[u8]) -> Result<VaultHeader> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let line = std::str::from_utf8(line)
        .map_err(|_| VaultKitError::Format("vault header is not valid UTF-8".into()))?;

    let fields: Vec<&str> = line.split(';').collect();
    if fields.first() != Some(&MAGIC) {
        return Err(VaultKitError::Format(format!("missing {MAGIC} header")));
    }

    let header = match fields.as_slice() {
        [_, "1.1", cipher] => {
            check_cipher(cipher)?;
            VaultHeader {
                version: "1.1".into(),
                vault_id: None,
            }
        }
        // The label is not covered by the HMAC.
        [_, "1.2", cipher, id] => {
            check_cipher(cipher)?;
            validate_vault_id(id).map_err(|_| {
                VaultKitError::Format(format!("invalid vault id '{id}' in header"))
            })?;
            VaultHeader {
                version: "1.2".into(),
                vault_id: Some((*id).to_string()),
            }
        }
        [_, "1.1" | "1.2", ..] => {
            return Err(VaultKitError::Format("malformed vault header".into()))
        }
        [_, version, ..] => {
            return Err(VaultKitError::Format(format!(
                "unsupported vault header version '{version}'"
            )))
        }
        _ => return Err(VaultKitError::Format("truncated vault header".into())),
    };
    Ok(header)
}

fn check_cipher(cipher: &str) -> Result<()> {
    if cipher != CIPHER_NAME {
        return Err(VaultKitError::Format(format!(
            "unsupported vault cipher '{cipher}'"
        )));
    }
    Ok(())
}

/// The three fields hidden in the hex body.
struct VaultBody {
    salt: Vec<u8>,
    hmac: Vec<u8>,
    ciphertext: Vec<u8>,
}

impl VaultBody {
    fn parse(body: &[u8]) -> Result<Self> {
        let inner = decode_lower_hex(body, "body")?;

        let fields: Vec<&[u8]> = inner.split(|&b| b == b'\n').collect();
        let [salt, hmac, ciphertext] = fields.as_slice() else {
            return Err(VaultKitError::Format(format!(
                "expected 3 body fields, found {}",
                fields.len()
            )));
        };

        let parts = Self {
            salt: decode_lower_hex(salt, "salt")?,
            hmac: decode_lower_hex(hmac, "hmac")?,
            ciphertext: decode_lower_hex(ciphertext, "ciphertext")?,
        };

        if parts.salt.is_empty() {
            return Err(VaultKitError::Format("salt is empty".into()));
        }
        if parts.hmac.len() != HMAC_LEN {
            return Err(VaultKitError::Format(format!(
                "hmac must be {HMAC_LEN} bytes, got {}",
                parts.hmac.len()
            )));
        }
        if parts.ciphertext.is_empty() || parts.ciphertext.len() % BLOCK_LEN != 0 {
            return Err(VaultKitError::Format(format!(
                "ciphertext length {} is not a positive multiple of {BLOCK_LEN}",
                parts.ciphertext.len()
            )));
        }
        Ok(parts)
    }
}

/// Decode hex as `ansible-vault` writes it: lowercase only.
fn decode_lower_hex(data: &[u8], what: &str) -> Result<Vec<u8>> {
    if !data
        .iter()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(b))
    {
        return Err(VaultKitError::Format(format!("{what} is not lowercase hex")));
    }
    hex::decode(data).map_err(|e| VaultKitError::Format(format!("{what}: {e}")))
}

/// Key material for one salt, wiped on drop.
struct DerivedKeys {
    aes_key: Zeroizing<[u8; KEY_LEN]>,
    hmac_key: Zeroizing<[u8; KEY_LEN]>,
    iv: Zeroizing<[u8; IV_LEN]>,
}

impl DerivedKeys {
    fn derive(password: &[u8], salt: &[u8]) -> Self {
        let mut derived = Zeroizing::new([0u8; DERIVED_LEN]);
        derive_pbkdf2(password, salt, PBKDF2_ITERATIONS, &mut derived[..]);

        let mut keys = Self {
            aes_key: Zeroizing::new([0u8; KEY_LEN]),
            hmac_key: Zeroizing::new([0u8; KEY_LEN]),
            iv: Zeroizing::new([0u8; IV_LEN]),
        };
        keys.aes_key.copy_from_slice(&derived[..KEY_LEN]);
        keys.hmac_key.copy_from_slice(&derived[KEY_LEN..KEY_LEN * 2]);
        keys.iv.copy_from_slice(&derived[KEY_LEN * 2..]);
        keys
    }

    fn apply_keystream(&self, buf: &mut [u8]) {
        let mut cipher = Aes256Ctr::new((&*self.aes_key).into(), (&*self.iv).into());
        cipher.apply_keystream(buf);
    }

    fn mac(&self, ciphertext: &[u8]) -> Result<Hmac<Sha256>> {
        let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(self.hmac_key.as_ref())
            .map_err(|e| VaultKitError::EncryptionFailed(format!("HMAC init failed: {e}")))?;
        mac.update(ciphertext);
        Ok(mac)
    }
}

fn pkcs7_pad(data: &[u8]) -> Vec<u8> {
    let pad = BLOCK_LEN - data.len() % BLOCK_LEN;
    let mut out = Vec::with_capacity(data.len() + pad);
    out.extend_from_slice(data);
    out.resize(data.len() + pad, pad as u8);
    out
}

fn pkcs7_unpad(data: &mut Vec<u8>) -> Result<()> {
    let pad = usize::from(*data.last().unwrap_or(&0));
    if pad == 0 || pad > BLOCK_LEN || pad > data.len() {
        return Err(VaultKitError::Format("invalid padding".into()));
    }
    if !data[data.len() - pad..].iter().all(|&b| usize::from(b) == pad) {
        return Err(VaultKitError::Format("invalid padding".into()));
    }
    data.truncate(data.len() - pad);
    Ok(())
}
