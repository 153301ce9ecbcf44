//! Vault module — the secret file on disk and its plaintext scratch copy.
//!
//! This module provides:
//! - Missing-file checks and atomic in-place replacement (`file`)
//! - A self-deleting temporary plaintext file for editing (`scratch`)

pub mod file;
pub mod scratch;

// Re-export the most commonly used items.
pub use file::{ensure_exists, read_secret_file, write_secret_file};
pub use scratch::ScratchFile;
