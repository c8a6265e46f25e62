//! The STORE (no compression) codec.

use crate::stream::{Stage, StreamInfo};
use crate::Result;

/// Pass-through stage: output is input, unchanged and unbuffered.
///
/// Serves as both the compressor and decompressor for STORE entries, and
/// keeps chains structurally uniform so callers never special-case the
/// uncompressed path.
#[derive(Default)]
pub struct CopyStage;

impl CopyStage {
    /// Creates a new pass-through stage.
    pub fn new() -> Self {
        Self
    }
}

impl Stage for CopyStage {
    fn name(&self) -> &'static str {
        "CopyStage"
    }

    fn process(&mut self, input: &[u8], _info: &mut StreamInfo, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(input);
        Ok(())
    }
}
