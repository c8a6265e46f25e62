//! Traditional (PKWARE) ZIP 2.0 stream cipher.
//!
//! The legacy ZIP encryption algorithm as specified in APPNOTE.TXT: three
//! 32-bit key words derived from the password, mutated by every byte
//! processed, and a 12-byte header prepended to the ciphertext for password
//! verification.
//!
//! This scheme is NOT secure by modern standards. It is implemented solely
//! for interoperability with existing encrypted ZIP files.
//!
//! The cipher here is pure byte/buffer transformation with no streaming
//! awareness; chunk reassembly lives in the
//! [`DecryptStage`](crate::stream::DecryptStage) and
//! [`EncryptStage`](crate::stream::EncryptStage) adapters.

use crate::crypto::{HeaderRandom, Password};
use crate::{Error, Result};

/// Size of the encryption header prepended to the ciphertext.
pub const HEADER_SIZE: usize = 12;

/// Initial values of the three key words, fixed by the format.
const KEY_INIT: [u32; 3] = [0x12345678, 0x23456789, 0x34567890];

/// Multiplier of the key-1 linear congruential step.
const KEY1_MULTIPLIER: u32 = 134775813;

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 {
                0xEDB88320 ^ (c >> 1)
            } else {
                c >> 1
            };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

/// CRC-32 lookup table (IEEE polynomial), used for the single-byte key
/// schedule steps. Computed at compile time.
static CRC_TABLE: [u32; 256] = build_crc_table();

#[inline]
fn crc32_step(crc: u32, byte: u8) -> u32 {
    (crc >> 8) ^ CRC_TABLE[((crc ^ byte as u32) & 0xFF) as usize]
}

/// Outcome of a buffer-level decryption attempt.
///
/// Password verification happens before any payload byte is decrypted; a
/// rejected attempt never surfaces garbage plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecryptOutcome {
    /// The header verified and the payload was decrypted.
    Verified(Vec<u8>),
    /// The header did not verify: wrong password or corrupted data.
    Rejected,
}

impl DecryptOutcome {
    /// Returns true if the password verified.
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }

    /// Returns the decrypted data, or `None` if the attempt was rejected.
    pub fn into_data(self) -> Option<Vec<u8>> {
        match self {
            Self::Verified(data) => Some(data),
            Self::Rejected => None,
        }
    }
}

/// The traditional PKWARE cipher state.
///
/// Key derivation from the password is the expensive part, so one instance
/// may be reused sequentially across multiple entries sharing a password
/// via [`reset`](Self::reset). Reuse must never be concurrent: key state is
/// mutated in place by every byte processed.
pub struct TraditionalCipher {
    password: Password,
    keys: [u32; 3],
    keys_ready: bool,
}

impl std::fmt::Debug for TraditionalCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraditionalCipher")
            .field("keys_ready", &self.keys_ready)
            .finish_non_exhaustive()
    }
}

impl TraditionalCipher {
    /// Creates a cipher for the given password. Keys are derived lazily on
    /// first use.
    pub fn new(password: &Password) -> Self {
        Self {
            password: password.clone(),
            keys: KEY_INIT,
            keys_ready: false,
        }
    }

    /// Derives the key state from the password.
    ///
    /// Seeds the three key words with their fixed constants, then folds
    /// every password byte through [`update_keys`](Self::update_keys).
    /// Deterministic: two ciphers with the same password produce identical
    /// key state and identical keystreams.
    pub fn init_keys(&mut self) {
        self.keys = KEY_INIT;
        for i in 0..self.password.len() {
            let byte = self.password.as_bytes()[i];
            self.update_keys(byte);
        }
        self.keys_ready = true;
    }

    fn ensure_keys(&mut self) {
        if !self.keys_ready {
            self.init_keys();
        }
    }

    /// Folds one byte into the key state.
    fn update_keys(&mut self, byte: u8) {
        self.keys[0] = crc32_step(self.keys[0], byte);
        self.keys[1] = self.keys[1].wrapping_add(self.keys[0] & 0xFF);
        self.keys[1] = self.keys[1].wrapping_mul(KEY1_MULTIPLIER).wrapping_add(1);
        self.keys[2] = crc32_step(self.keys[2], (self.keys[1] >> 24) as u8);
    }

    #[inline]
    fn keystream_byte(&self) -> u8 {
        let t = (self.keys[2] | 2) & 0xFFFF;
        ((t.wrapping_mul(t ^ 1)) >> 8) as u8
    }

    /// Decrypts a single byte. Keys are updated with the plaintext.
    pub fn decrypt_byte(&mut self, byte: u8) -> u8 {
        let plain = byte ^ self.keystream_byte();
        self.update_keys(plain);
        plain
    }

    /// Encrypts a single byte. Keys are updated with the plaintext, the
    /// same value the decrypting side will update with; updating with the
    /// ciphertext instead silently desynchronizes the stream after the
    /// first byte.
    pub fn encrypt_byte(&mut self, byte: u8) -> u8 {
        let cipher = byte ^ self.keystream_byte();
        self.update_keys(byte);
        cipher
    }

    /// Encrypts a whole buffer, prepending the 12-byte header.
    ///
    /// Header bytes 0-10 are random filler from `random`; byte 11 is the
    /// verification byte, bits 24-31 of the plaintext CRC-32 (the only
    /// convention produced on write). The output is exactly
    /// `data.len() + 12` bytes, including for empty input.
    pub fn encrypt(
        &mut self,
        data: &[u8],
        crc32: u32,
        random: &mut HeaderRandom,
    ) -> Result<Vec<u8>> {
        self.ensure_keys();

        let mut header = [0u8; HEADER_SIZE];
        random.fill(&mut header[..HEADER_SIZE - 1])?;
        header[HEADER_SIZE - 1] = (crc32 >> 24) as u8;

        let mut out = Vec::with_capacity(HEADER_SIZE + data.len());
        for &byte in &header {
            out.push(self.encrypt_byte(byte));
        }
        for &byte in data {
            out.push(self.encrypt_byte(byte));
        }
        Ok(out)
    }

    /// Decrypts a whole buffer, verifying the password against the header.
    ///
    /// The password is accepted if ANY of these hold, broadest legacy
    /// support first:
    /// - header byte 11 equals bits 24-31 of `crc32` (PKZIP >= 2.0),
    /// - header byte 11 equals bits 8-15 of `last_mod_time`,
    /// - header bytes 10-11 equal bits 8-23 of `crc32` (pre-2.0 tools).
    ///
    /// A failed verification returns [`DecryptOutcome::Rejected`] without
    /// touching the payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IncompleteEncryptedData`] if `data` is shorter than
    /// the 12-byte header.
    pub fn decrypt(
        &mut self,
        data: &[u8],
        crc32: u32,
        last_mod_time: u32,
    ) -> Result<DecryptOutcome> {
        if data.len() < HEADER_SIZE {
            return Err(Error::IncompleteEncryptedData {
                received: data.len(),
            });
        }

        self.ensure_keys();

        let mut header = [0u8; HEADER_SIZE];
        for (plain, &cipher) in header.iter_mut().zip(&data[..HEADER_SIZE]) {
            *plain = self.decrypt_byte(cipher);
        }

        let check = header[11];
        let valid = check == (crc32 >> 24) as u8
            || check == ((last_mod_time >> 8) & 0xFF) as u8
            || (check == ((crc32 >> 16) & 0xFF) as u8
                && header[10] == ((crc32 >> 8) & 0xFF) as u8);

        if !valid {
            return Ok(DecryptOutcome::Rejected);
        }

        let mut out = Vec::with_capacity(data.len() - HEADER_SIZE);
        for &byte in &data[HEADER_SIZE..] {
            out.push(self.decrypt_byte(byte));
        }
        Ok(DecryptOutcome::Verified(out))
    }

    /// Clears the derived key state, keeping the password.
    ///
    /// Keys are re-derived on next use, so one instance can process
    /// multiple entries sharing a password.
    pub fn reset(&mut self) {
        self.keys = KEY_INIT;
        self.keys_ready = false;
    }

    /// Returns the current key words. Test hook for determinism checks.
    #[cfg(test)]
    pub(crate) fn keys(&self) -> [u32; 3] {
        self.keys
    }
}
