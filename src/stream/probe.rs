//! Pass-through metering stages.
//!
//! Probes forward every chunk unmodified while maintaining a running
//! accumulator, and write the final value into the stream metadata at
//! finish. They are how sizes and checksums are captured without ever
//! buffering the payload: the write path uses a CRC-32 probe plus one
//! length probe per size domain (compressed vs. uncompressed).

use crate::checksum::Crc32;
use crate::stream::{MetaValue, Stage, StreamInfo};
use crate::Result;

/// Pass-through stage computing a running CRC-32 of everything it sees.
///
/// On finish the final value is written under the `crc32` metadata key,
/// where downstream stages (notably the encrypt adapter) can read it.
#[derive(Default)]
pub struct Crc32Probe {
    crc: Crc32,
}

impl Crc32Probe {
    /// Creates a new CRC-32 probe.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Stage for Crc32Probe {
    fn name(&self) -> &'static str {
        "Crc32Probe"
    }

    fn process(&mut self, input: &[u8], _info: &mut StreamInfo, out: &mut Vec<u8>) -> Result<()> {
        self.crc.update(input);
        out.extend_from_slice(input);
        Ok(())
    }

    fn finish(&mut self, info: &mut StreamInfo, _out: &mut Vec<u8>) -> Result<()> {
        info.set("crc32", MetaValue::U32(self.crc.finalize()));
        Ok(())
    }
}

/// Pass-through stage counting the bytes that flow through it.
///
/// The count is written at finish under a caller-supplied key, so the same
/// stage type meters both size domains (`uncompressedSize` before a
/// compressor, `compressedSize` after it) as well as the read-path
/// `data_length` check.
pub struct DataLengthProbe {
    key: &'static str,
    length: u64,
}

impl DataLengthProbe {
    /// Creates a probe that records its count under `key`.
    pub fn new(key: &'static str) -> Self {
        Self { key, length: 0 }
    }
}

impl Stage for DataLengthProbe {
    fn name(&self) -> &'static str {
        "DataLengthProbe"
    }

    fn process(&mut self, input: &[u8], _info: &mut StreamInfo, out: &mut Vec<u8>) -> Result<()> {
        self.length += input.len() as u64;
        out.extend_from_slice(input);
        Ok(())
    }

    fn finish(&mut self, info: &mut StreamInfo, _out: &mut Vec<u8>) -> Result<()> {
        info.set(self.key, MetaValue::U64(self.length));
        Ok(())
    }
}
