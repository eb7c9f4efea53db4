//! Envelope cryptography.
//!
//! The gateway encrypts each callback with AES-256-CBC under a pre-shared key.
//! This module owns the key type and the envelope codec.

pub mod envelope;
pub mod key;

pub use envelope::{decrypt, encrypt_packet, encrypt_with_iv, has_envelope, IV_LEN};
pub use key::{EncryptKey, KEY_LEN};
