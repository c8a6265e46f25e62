//! Encryption stage for writing traditionally encrypted entries.

use crate::crypto::{EncryptionMethod, HeaderRandom, Password, TraditionalCipher};
use crate::stream::{MetaValue, Stage, StreamInfo};
use crate::Result;

/// Configuration for an [`EncryptStage`].
#[derive(Debug)]
pub struct EncryptOptions {
    /// Password to derive the cipher keys from.
    pub password: Password,
    /// Encryption method name; only `"traditional"` is accepted.
    pub method: String,
    /// CRC-32 to stamp into the verification header when no upstream probe
    /// published one in the stream metadata.
    pub crc32: u32,
    /// Source of the 11 random header filler bytes.
    pub random: HeaderRandom,
}

/// A stage that traditionally encrypts its whole input at finish.
///
/// The verification header carries the high byte of the plaintext CRC-32,
/// which is only known once the stream ends, so the stage accumulates all
/// input and emits header plus ciphertext in one burst at finish. An
/// upstream [`Crc32Probe`](crate::stream::Crc32Probe) flushes in chain
/// order before this stage, so the metadata `crc32` value is already final
/// when the header is built.
pub struct EncryptStage {
    cipher: TraditionalCipher,
    crc32_fallback: u32,
    random: HeaderRandom,
    buffer: Vec<u8>,
}

impl EncryptStage {
    /// Creates an encrypt stage, validating the encryption method eagerly.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedEncryption`](crate::Error::UnsupportedEncryption)
    /// if the method is anything but `"traditional"`.
    pub fn new(options: EncryptOptions) -> Result<Self> {
        EncryptionMethod::parse(&options.method)?;
        let mut cipher = TraditionalCipher::new(&options.password);
        cipher.init_keys();
        Ok(Self {
            cipher,
            crc32_fallback: options.crc32,
            random: options.random,
            buffer: Vec::new(),
        })
    }
}

impl Stage for EncryptStage {
    fn name(&self) -> &'static str {
        "EncryptStage"
    }

    fn process(&mut self, input: &[u8], _info: &mut StreamInfo, _out: &mut Vec<u8>) -> Result<()> {
        self.buffer.extend_from_slice(input);
        Ok(())
    }

    fn finish(&mut self, info: &mut StreamInfo, out: &mut Vec<u8>) -> Result<()> {
        let crc32 = info.u32("crc32").unwrap_or(self.crc32_fallback);
        let data = std::mem::take(&mut self.buffer);
        let encrypted = self.cipher.encrypt(&data, crc32, &mut self.random)?;

        // The header grows the payload; downstream consumers need the
        // post-encryption size.
        info.set("compressedSize", MetaValue::U64(encrypted.len() as u64));
        out.extend_from_slice(&encrypted);
        Ok(())
    }
}
