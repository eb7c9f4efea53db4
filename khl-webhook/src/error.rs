//! Error types for envelope decryption and configuration.

use thiserror::Error;

/// Failure to turn a request body into a protocol packet.
///
/// Every base64, cipher, UTF-8 and JSON problem collapses into
/// [`DecryptError::DecryptionFailed`]; callers never branch on the sub-cause.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecryptError {
    /// An encrypted envelope arrived but no key was provisioned.
    #[error("no key configured for encrypted request")]
    NoKeyConfigured,

    /// A plaintext body arrived while decryption is mandatory.
    #[error("unencrypted request")]
    UnencryptedRequest,

    /// The envelope could not be decoded, decrypted or parsed.
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
}

/// Invalid process or pipeline configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("encrypt key must be exactly 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("port must be between 1 and 65535, got {0}")]
    InvalidPort(i64),

    #[error("webhook path must start with '/': {0}")]
    InvalidWebhookPath(String),
}
