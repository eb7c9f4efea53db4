//! Pre-shared AES-256 key.

use std::fmt;

use crate::error::ConfigError;

/// Length of an AES-256 key in bytes.
pub const KEY_LEN: usize = 32;

/// A 32-byte pre-shared encryption key.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptKey([u8; KEY_LEN]);

impl EncryptKey {
    /// Build a key from exactly 32 raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let key: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| ConfigError::InvalidKeyLength(bytes.len()))?;
        Ok(Self(key))
    }

    /// Build a key from the secret shown in the developer console.
    ///
    /// Secrets shorter than 32 bytes are right-padded with zero bytes.
    /// Longer secrets are rejected rather than truncated.
    pub fn from_secret(secret: &str) -> Result<Self, ConfigError> {
        let raw = secret.as_bytes();
        if raw.len() > KEY_LEN {
            return Err(ConfigError::InvalidKeyLength(raw.len()));
        }

        let mut key = [0u8; KEY_LEN];
        key[..raw.len()].copy_from_slice(raw);
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for EncryptKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptKey(<redacted>)")
    }
}
