//! Random sources for the encryption header filler.
//!
//! The 12-byte traditional encryption header starts with 11 random filler
//! bytes. The random source is an explicit dependency chosen by the caller
//! rather than probed from the environment at run time: [`HeaderRandom::strong`]
//! uses the operating system CSPRNG, [`HeaderRandom::weak_fallback`] is a
//! non-cryptographic last resort for environments without one. The weak
//! variant is never selected implicitly.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::{Error, Result};

/// Source of random bytes for the encryption header filler.
pub enum HeaderRandom {
    /// Operating system CSPRNG. This is the variant to use.
    Strong,
    /// Non-cryptographic xorshift generator. NOT suitable for protecting
    /// data; acceptable only when no strong source exists.
    Weak {
        /// Internal xorshift64 state, never zero.
        state: u64,
    },
}

impl HeaderRandom {
    /// Creates the cryptographically strong source.
    pub fn strong() -> Self {
        Self::Strong
    }

    /// Creates the weak fallback source, seeded from the system clock.
    ///
    /// Every construction logs a warning: callers must not treat this
    /// variant as equivalent to [`HeaderRandom::strong`].
    pub fn weak_fallback() -> Self {
        log::warn!("using non-cryptographic fallback RNG for encryption header filler");
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x9E37_79B9_7F4A_7C15);
        Self::Weak {
            state: seed | 1, // xorshift state must be non-zero
        }
    }

    /// Returns true if this source is cryptographically strong.
    pub fn is_strong(&self) -> bool {
        matches!(self, Self::Strong)
    }

    /// Fills `buf` with random bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CryptoError`] if the system RNG is unavailable.
    /// The strong variant never falls back to the weak one.
    pub fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        match self {
            Self::Strong => getrandom::getrandom(buf)
                .map_err(|e| Error::CryptoError(format!("system RNG unavailable: {e}"))),
            Self::Weak { state } => {
                for byte in buf.iter_mut() {
                    let mut x = *state;
                    x ^= x << 13;
                    x ^= x >> 7;
                    x ^= x << 17;
                    *state = x;
                    *byte = (x >> 32) as u8;
                }
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for HeaderRandom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strong => f.write_str("HeaderRandom::Strong"),
            Self::Weak { .. } => f.write_str("HeaderRandom::Weak"),
        }
    }
}
