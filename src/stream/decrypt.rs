//! Decryption stage for traditionally encrypted entries.

use crate::crypto::{EncryptionMethod, Password, TraditionalCipher, HEADER_SIZE};
use crate::stream::{Stage, StreamInfo};
use crate::{Error, Result};

/// General-purpose bit 3: a data descriptor follows the entry, and the
/// header verification byte carries the DOS time instead of the CRC.
const FLAG_USES_DATA_DESCRIPTOR: u16 = 0x0008;

/// Configuration for a [`DecryptStage`].
#[derive(Debug, Clone)]
pub struct DecryptOptions {
    /// Password to derive the cipher keys from.
    pub password: Password,
    /// Encryption method name from the entry descriptor.
    pub method: String,
    /// Expected CRC-32 of the decompressed plaintext.
    pub crc32: u32,
    /// Raw 32-bit DOS date/time of the entry.
    pub dos_date_raw: u32,
    /// General-purpose bit flag from the entry header.
    pub bit_flag: u16,
}

enum Phase {
    /// Accumulating bytes toward the 12-byte header.
    AwaitingHeader { buffer: Vec<u8> },
    /// Header verified; decrypting byte-for-byte.
    Streaming,
}

/// A stage that decrypts traditionally encrypted data.
///
/// The 12-byte header may arrive split across any chunk boundaries, so
/// incoming bytes buffer until the header is complete; the password is then
/// verified before a single payload byte is surfaced. After verification
/// the cipher is self-synchronizing per byte and the stage forwards chunks
/// with no further buffering.
pub struct DecryptStage {
    cipher: TraditionalCipher,
    crc32: u32,
    dos_date_raw: u32,
    bit_flag: u16,
    phase: Phase,
}

impl DecryptStage {
    /// Creates a decrypt stage, validating the encryption method eagerly.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedEncryption`] before any chain exists if
    /// the method is anything but `"traditional"`.
    pub fn new(options: &DecryptOptions) -> Result<Self> {
        EncryptionMethod::parse(&options.method)?;
        let mut cipher = TraditionalCipher::new(&options.password);
        cipher.init_keys();
        Ok(Self {
            cipher,
            crc32: options.crc32,
            dos_date_raw: options.dos_date_raw,
            bit_flag: options.bit_flag,
            phase: Phase::AwaitingHeader { buffer: Vec::new() },
        })
    }

    /// The verification byte this entry's header must match, selected by
    /// the general-purpose bit flag: bit 3 set means the DOS time high
    /// byte, clear means the CRC high byte.
    fn expected_check_byte(&self) -> u8 {
        if self.bit_flag & FLAG_USES_DATA_DESCRIPTOR != 0 {
            ((self.dos_date_raw >> 8) & 0xFF) as u8
        } else {
            (self.crc32 >> 24) as u8
        }
    }
}

impl Stage for DecryptStage {
    fn name(&self) -> &'static str {
        "DecryptStage"
    }

    fn process(&mut self, input: &[u8], _info: &mut StreamInfo, out: &mut Vec<u8>) -> Result<()> {
        if let Phase::AwaitingHeader { buffer } = &mut self.phase {
            buffer.extend_from_slice(input);
            if buffer.len() < HEADER_SIZE {
                return Ok(());
            }
            let data = std::mem::take(buffer);
            self.phase = Phase::Streaming;

            let mut check = 0u8;
            for &byte in &data[..HEADER_SIZE] {
                check = self.cipher.decrypt_byte(byte);
            }
            if check != self.expected_check_byte() {
                return Err(Error::WrongPassword);
            }

            // Header-trailing bytes already present decrypt immediately.
            out.reserve(data.len() - HEADER_SIZE);
            for &byte in &data[HEADER_SIZE..] {
                out.push(self.cipher.decrypt_byte(byte));
            }
            return Ok(());
        }

        out.reserve(input.len());
        for &byte in input {
            out.push(self.cipher.decrypt_byte(byte));
        }
        Ok(())
    }

    fn finish(&mut self, _info: &mut StreamInfo, _out: &mut Vec<u8>) -> Result<()> {
        match &self.phase {
            Phase::AwaitingHeader { buffer } if !buffer.is_empty() => {
                Err(Error::IncompleteEncryptedData {
                    received: buffer.len(),
                })
            }
            _ => Ok(()),
        }
    }
}
