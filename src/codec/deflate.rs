//! The DEFLATE codec, raw (headerless) as ZIP entries store it.

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use crate::stream::{Stage, StreamInfo};
use crate::{Error, Result};

/// Output growth increment while driving the (de)compressor.
const BUF_GROWTH: usize = 32 * 1024;

/// Streaming raw-deflate compressor.
///
/// Wraps the low-level [`flate2::Compress`] state machine: each input chunk
/// is fed with no flush, so the compressor is free to hold data across
/// chunk boundaries; the stream is terminated at finish.
pub struct DeflateCompressStage {
    compress: Compress,
}

impl DeflateCompressStage {
    /// Creates a compressor at the given level (1 fastest, 9 best).
    pub fn new(level: u32) -> Self {
        Self {
            // zlib_header = false: ZIP stores raw deflate streams
            compress: Compress::new(Compression::new(level), false),
        }
    }
}

impl Stage for DeflateCompressStage {
    fn name(&self) -> &'static str {
        "DeflateCompressStage"
    }

    fn process(&mut self, input: &[u8], _info: &mut StreamInfo, out: &mut Vec<u8>) -> Result<()> {
        let mut pos = 0;
        while pos < input.len() {
            if out.capacity() == out.len() {
                out.reserve(BUF_GROWTH);
            }
            let before = self.compress.total_in();
            self.compress
                .compress_vec(&input[pos..], out, FlushCompress::None)
                .map_err(|e| Error::Codec(format!("deflate: {e}")))?;
            pos += (self.compress.total_in() - before) as usize;
        }
        Ok(())
    }

    fn finish(&mut self, _info: &mut StreamInfo, out: &mut Vec<u8>) -> Result<()> {
        loop {
            if out.capacity() == out.len() {
                out.reserve(BUF_GROWTH);
            }
            let status = self
                .compress
                .compress_vec(&[], out, FlushCompress::Finish)
                .map_err(|e| Error::Codec(format!("deflate: {e}")))?;
            if status == Status::StreamEnd {
                return Ok(());
            }
        }
    }
}

/// Streaming raw-deflate decompressor.
///
/// Tracks the deflate final-block marker; input arriving after the stream
/// ended is a corruption error rather than silently dropped.
pub struct DeflateDecompressStage {
    decompress: Decompress,
    done: bool,
}

impl DeflateDecompressStage {
    /// Creates a decompressor for a raw deflate stream.
    pub fn new() -> Self {
        Self {
            decompress: Decompress::new(false),
            done: false,
        }
    }
}

impl Default for DeflateDecompressStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for DeflateDecompressStage {
    fn name(&self) -> &'static str {
        "DeflateDecompressStage"
    }

    fn process(&mut self, input: &[u8], _info: &mut StreamInfo, out: &mut Vec<u8>) -> Result<()> {
        let mut pos = 0;
        while pos < input.len() {
            if self.done {
                return Err(Error::Codec(
                    "unexpected data after end of deflate stream".to_string(),
                ));
            }
            if out.capacity() == out.len() {
                out.reserve(BUF_GROWTH);
            }
            let before = self.decompress.total_in();
            let status = self
                .decompress
                .decompress_vec(&input[pos..], out, FlushDecompress::None)
                .map_err(|e| Error::Codec(format!("inflate: {e}")))?;
            pos += (self.decompress.total_in() - before) as usize;
            if status == Status::StreamEnd {
                self.done = true;
            }
        }
        Ok(())
    }

    fn finish(&mut self, _info: &mut StreamInfo, out: &mut Vec<u8>) -> Result<()> {
        // A zero-byte stream never starts; tolerate it as empty output.
        if self.done || self.decompress.total_in() == 0 {
            return Ok(());
        }
        loop {
            if out.capacity() == out.len() {
                out.reserve(BUF_GROWTH);
            }
            let before_out = self.decompress.total_out();
            let status = self
                .decompress
                .decompress_vec(&[], out, FlushDecompress::Finish)
                .map_err(|e| Error::Codec(format!("inflate: {e}")))?;
            if status == Status::StreamEnd {
                self.done = true;
                return Ok(());
            }
            if self.decompress.total_out() == before_out {
                return Err(Error::Codec("truncated deflate stream".to_string()));
            }
        }
    }
}
