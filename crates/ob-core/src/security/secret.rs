use std::fmt;
use std::ops::Deref;
use zeroize::Zeroize;

/// A sensitive string (password, one-time code) that must never be logged,
/// cloned, or serialized.
///
/// - not `Clone`
/// - not `Serialize` / `Deserialize`
/// - `Debug` / `Display` print `[REDACTED]`
/// - memory is wiped on drop
pub struct SecretString {
    inner: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: value.into(),
        }
    }

    /// Borrow the secret. The only way to read it.
    pub fn expose(&self) -> &str {
        &self.inner
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Copy the secret into a fresh, independently wiped value.
    ///
    /// Used when one secret must feed two backend calls (register, then login).
    pub fn duplicate(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Deref for SecretString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.expose()
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}
