//! Compression codecs behind a uniform stage interface.
//!
//! Every codec exposes a compressing stage and a decompressing stage, so
//! chains are assembled identically whatever the method; [`CompressionMethod`]
//! is the registry mapping ZIP method names to constructors. STORE is
//! always available; DEFLATE is behind the `deflate` feature.

#[cfg(feature = "deflate")]
mod deflate;
mod store;

#[cfg(feature = "deflate")]
pub use deflate::{DeflateCompressStage, DeflateDecompressStage};
pub use store::CopyStage;

use crate::stream::Stage;
use crate::{Error, Result};

/// Options applied when building a compressing stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompressionOptions {
    /// DEFLATE level, 1 (fastest) to 9 (best). `None` uses the codec
    /// default; STORE ignores it.
    pub level: Option<u32>,
}

/// A supported compression method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// No compression; bytes are stored as-is.
    Store,
    /// Raw deflate as stored in ZIP entries.
    #[cfg(feature = "deflate")]
    Deflate,
}

impl CompressionMethod {
    /// Looks up a method by its ZIP name, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownCompression`] for names with no registered
    /// codec, including `"DEFLATE"` when the feature is disabled.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_uppercase().as_str() {
            "STORE" => Ok(Self::Store),
            #[cfg(feature = "deflate")]
            "DEFLATE" => Ok(Self::Deflate),
            _ => Err(Error::UnknownCompression {
                name: name.to_string(),
            }),
        }
    }

    /// The canonical ZIP method name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Store => "STORE",
            #[cfg(feature = "deflate")]
            Self::Deflate => "DEFLATE",
        }
    }

    /// Builds a compressing stage for this method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCompressionLevel`] if a DEFLATE level
    /// outside 1-9 is requested.
    pub fn compress_stage(&self, options: &CompressionOptions) -> Result<Box<dyn Stage>> {
        match self {
            Self::Store => Ok(Box::new(CopyStage::new())),
            #[cfg(feature = "deflate")]
            Self::Deflate => {
                let level = options.level.unwrap_or(6);
                if !(1..=9).contains(&level) {
                    return Err(Error::InvalidCompressionLevel { level });
                }
                Ok(Box::new(DeflateCompressStage::new(level)))
            }
        }
    }

    /// Builds a decompressing stage for this method.
    pub fn uncompress_stage(&self) -> Box<dyn Stage> {
        match self {
            Self::Store => Box::new(CopyStage::new()),
            #[cfg(feature = "deflate")]
            Self::Deflate => Box::new(DeflateDecompressStage::new()),
        }
    }
}
