//! Password handling for traditional ZIP encryption.

use zeroize::Zeroizing;

/// A password for entry encryption/decryption.
///
/// This type stores the password securely and provides the raw-byte view
/// required by the traditional (PKWARE) key schedule, which folds the
/// password into the cipher keys byte by byte.
#[derive(Clone)]
pub struct Password {
    inner: Zeroizing<Vec<u8>>,
}

impl Password {
    /// Creates a new password from a string.
    pub fn new<S: AsRef<str>>(password: S) -> Self {
        Self {
            inner: Zeroizing::new(password.as_ref().as_bytes().to_vec()),
        }
    }

    /// Returns the password bytes fed to the key schedule.
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    /// Returns true if the password is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the length of the password in bytes.
    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Don't expose the actual password in debug output
        f.debug_struct("Password")
            .field("len", &self.inner.len())
            .finish()
    }
}

impl From<&str> for Password {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Password {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
