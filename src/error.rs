//! Error types for streaming ZIP pipelines.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes of the pipeline core, along with a convenient
//! [`Result<T>`] type alias.
//!
//! # Error Categories
//!
//! Errors fall into a small taxonomy:
//!
//! | Category | Variants | Raised |
//! |----------|----------|--------|
//! | Configuration | [`UnknownCompression`][Self::UnknownCompression], [`InvalidCompressionLevel`][Self::InvalidCompressionLevel], [`UnsupportedEncryption`][Self::UnsupportedEncryption] | At chain construction, before any byte flows |
//! | Missing credential | [`PasswordRequired`][Self::PasswordRequired] | At content-access time |
//! | Authentication | [`WrongPassword`][Self::WrongPassword] | During header verification |
//! | Truncation | [`IncompleteEncryptedData`][Self::IncompleteEncryptedData] | At stream end |
//! | Internal consistency | [`SizeMismatch`][Self::SizeMismatch], [`MissingMetadata`][Self::MissingMetadata] | At stream end |
//!
//! All of these are raised once, at the stage where detected, and are
//! terminal for the chain: no stage retries automatically. The caller
//! decides whether to rebuild a fresh chain (e.g. after prompting for a
//! new password).

use crate::stream::State;

/// The main error type for pipeline operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The requested compression method name is not recognized.
    ///
    /// This is a configuration error: it is reported when the codec is
    /// selected, never mid-stream.
    #[error("'{name}' is not a valid compression method")]
    UnknownCompression {
        /// The name that was requested.
        name: String,
    },

    /// An invalid compression level was provided.
    ///
    /// Deflate accepts levels 1-9. The level is validated when the
    /// compress stage is constructed, not while data flows.
    #[error("invalid compression level {level}: must be 1-9")]
    InvalidCompressionLevel {
        /// The invalid level that was provided.
        level: u32,
    },

    /// The entry uses an encryption method this crate does not implement.
    ///
    /// Only traditional (PKWARE / ZipCrypto) encryption is supported. The
    /// method name is validated eagerly when encrypt/decrypt intent is
    /// established; data is never silently passed through unencrypted.
    #[error("unsupported encryption method '{method}': {detail}")]
    UnsupportedEncryption {
        /// The method name that was requested.
        method: String,
        /// Why the method is rejected.
        detail: &'static str,
    },

    /// A password is required but none was provided.
    ///
    /// Returned when building a content pipeline for an entry that carries
    /// an encryption descriptor. Distinguishable from all other errors so
    /// callers can prompt for a password and rebuild the chain.
    #[error("password required for encrypted entry")]
    PasswordRequired,

    /// Header verification failed during decryption.
    ///
    /// The scheme cannot distinguish a wrong password from corrupted
    /// ciphertext; either way no plaintext is surfaced.
    #[error("incorrect password or corrupted data")]
    WrongPassword,

    /// The stream ended before a full 12-byte encryption header arrived.
    #[error("incomplete encrypted data: stream ended after {received} header bytes")]
    IncompleteEncryptedData {
        /// How many header bytes were received before end of stream.
        received: usize,
    },

    /// Decompressed length disagrees with the recorded uncompressed size.
    ///
    /// This indicates archive corruption or a codec bug, not a user-facing
    /// condition, and is never silently tolerated.
    #[error("uncompressed data size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// The size recorded in the entry metadata.
        expected: u64,
        /// The size actually produced by decompression.
        actual: u64,
    },

    /// A completed chain's metadata is missing a key needed to assemble
    /// the result, indicating a misassembled chain.
    #[error("stream metadata is missing the '{key}' entry")]
    MissingMetadata {
        /// The absent metadata key.
        key: &'static str,
    },

    /// The pipeline is finished or errored and no longer accepts input.
    #[error("pipeline is {state:?} and no longer accepts input")]
    PipelineClosed {
        /// The terminal state the pipeline is in.
        state: State,
    },

    /// A codec failed while transforming data.
    #[error("codec error: {0}")]
    Codec(String),

    /// A cryptographic primitive failed (e.g. the system RNG is unavailable).
    #[error("cryptographic error: {0}")]
    CryptoError(String),
}

impl Error {
    /// Returns `true` if this error was raised at chain-construction time,
    /// before any byte was processed.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnknownCompression { .. }
                | Error::InvalidCompressionLevel { .. }
                | Error::UnsupportedEncryption { .. }
        )
    }

    /// Returns `true` if this is an encryption-related error.
    pub fn is_encryption_error(&self) -> bool {
        matches!(
            self,
            Error::WrongPassword
                | Error::PasswordRequired
                | Error::UnsupportedEncryption { .. }
                | Error::CryptoError(_)
        )
    }

    /// Returns `true` if this error might be recoverable with different
    /// input, e.g. by prompting for a password and rebuilding the chain
    /// from the still-valid raw compressed bytes.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::WrongPassword | Error::PasswordRequired)
    }

    /// Returns `true` if this is a data corruption error.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::SizeMismatch { .. } | Error::IncompleteEncryptedData { .. }
        )
    }
}

/// A specialized Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
