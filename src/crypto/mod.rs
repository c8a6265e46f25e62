//! Traditional (PKWARE) ZIP encryption support.
//!
//! This module implements the legacy ZIP 2.0 stream cipher keyed by a
//! password: the key schedule, the per-byte transform, and the buffer-level
//! encrypt/decrypt operations around the 12-byte verification header.
//!
//! The scheme is explicitly insecure by modern standards and is preserved
//! only for interoperability. No other encryption method is implemented;
//! method names are validated eagerly via [`EncryptionMethod::parse`] so
//! that unsupported methods fail before any data flows.

mod password;
mod random;
mod traditional;

pub use password::Password;
pub use random::HeaderRandom;
pub use traditional::{DecryptOutcome, HEADER_SIZE, TraditionalCipher};

use crate::{Error, Result};

/// Encryption methods an entry's descriptor may name.
///
/// Only [`Traditional`](Self::Traditional) is implemented. Parsing any
/// other name is a configuration error raised at the moment encrypt or
/// decrypt intent is established, never a silent pass-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionMethod {
    /// Traditional PKWARE (ZipCrypto) encryption.
    Traditional,
}

impl EncryptionMethod {
    /// Validates an encryption method name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedEncryption`] for anything other than
    /// `"traditional"`, with a distinguishable message for `"aes"`
    /// (recognized but unimplemented) versus unknown names.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "traditional" => Ok(Self::Traditional),
            "aes" => Err(Error::UnsupportedEncryption {
                method: name.to_string(),
                detail: "AES is recognized but not implemented; only traditional \
                         (PKWARE) encryption is available",
            }),
            _ => Err(Error::UnsupportedEncryption {
                method: name.to_string(),
                detail: "only 'traditional' encryption is supported",
            }),
        }
    }

    /// Returns the canonical method name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Traditional => "traditional",
        }
    }
}
