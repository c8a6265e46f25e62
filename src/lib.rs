//! Streaming ZIP content pipelines with traditional (PKWARE) encryption.
//!
//! This crate provides the data-plane core of a ZIP library: chainable
//! streaming stages for compression, checksumming, length accounting, and
//! the legacy ZIP 2.0 stream cipher, plus the [`CompressedObject`] bridge
//! that assembles those stages into read and write chains for one entry's
//! payload. Container parsing and serialization (local headers, the central
//! directory) are deliberately out of scope.
//!
//! # Reading an entry's content
//!
//! ```rust
//! use zipstream::{CompressedObject, CompressionMethod};
//! use zipstream::checksum::Crc32;
//!
//! let content = b"stored without compression";
//! let object = CompressedObject {
//!     compressed_size: content.len() as u64,
//!     uncompressed_size: content.len() as u64,
//!     crc32: Crc32::compute(content),
//!     compression: CompressionMethod::Store,
//!     data: content.to_vec(),
//!     encryption: None,
//! };
//! assert_eq!(object.read_content(None).unwrap(), content);
//! ```
//!
//! # Writing with probes
//!
//! ```rust
//! use zipstream::{CompressedObject, CompressionMethod};
//!
//! let mut chain = CompressedObject::compress_pipeline(
//!     CompressionMethod::Store,
//!     &Default::default(),
//! ).unwrap();
//! let data = chain.run(b"payload").unwrap();
//! let object = CompressedObject::from_stream(chain.info(), data).unwrap();
//! assert_eq!(object.uncompressed_size, 7);
//! ```
//!
//! # Encryption
//!
//! Traditional (PKWARE / ZipCrypto) encryption is supported for
//! interoperability with existing archives. It is NOT secure by modern
//! standards; see [`crypto`] for details.
//!
//! # Feature flags
//!
//! - `deflate` (default): DEFLATE codec via [`flate2`] with the zlib-rs
//!   backend. Without it only STORE entries are supported.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod checksum;
pub mod codec;
pub mod crypto;
pub mod error;
pub mod object;
pub mod stream;

pub use codec::{CompressionMethod, CompressionOptions};
pub use crypto::Password;
pub use error::{Error, Result};
pub use object::{dos_date_time, CompressedObject, EncryptionInfo};
pub use stream::Pipeline;

/// Chunk size used by [`Pipeline::run`] when slicing a whole buffer into
/// the chain.
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;
