//! Encrypted envelope codec.
//!
//! Wire format of `{ "encrypt": E }`:
//!
//! ```text
//! base64( IV[16] || base64( AES-256-CBC-PKCS7(key, IV, json) ) )
//! ```
//!
//! The ciphertext is base64-encoded twice. The inner encoding is part of the
//! upstream wire format and must be kept as is.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use serde_json::{json, Value};

use super::key::EncryptKey;
use crate::error::DecryptError;

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

/// Length of the initialization vector prefix.
pub const IV_LEN: usize = 16;

/// True if the body carries a string `encrypt` field.
pub fn has_envelope(body: &Value) -> bool {
    body.get("encrypt").is_some_and(Value::is_string)
}

/// Turn a request body into the JSON packet it carries.
///
/// * Envelope present: decrypt it with `key`.
/// * Envelope absent: fail with [`DecryptError::UnencryptedRequest`] when
///   `ignore_on_plain` is set, otherwise return the body unchanged.
pub fn decrypt(
    body: Value,
    key: Option<&EncryptKey>,
    ignore_on_plain: bool,
) -> Result<Value, DecryptError> {
    match body.get("encrypt").and_then(Value::as_str) {
        Some(encrypted) => {
            let key = key.ok_or(DecryptError::NoKeyConfigured)?;
            open_envelope(encrypted, key)
        }
        None if ignore_on_plain => Err(DecryptError::UnencryptedRequest),
        None => Ok(body),
    }
}

fn open_envelope(encrypted: &str, key: &EncryptKey) -> Result<Value, DecryptError> {
    let outer = BASE64
        .decode(encrypted)
        .map_err(|e| failed(format!("envelope is not base64: {e}")))?;

    if outer.len() < IV_LEN {
        return Err(failed(format!(
            "envelope is {} bytes, shorter than the iv",
            outer.len()
        )));
    }
    let (iv, inner) = outer.split_at(IV_LEN);

    let ciphertext = BASE64
        .decode(inner)
        .map_err(|e| failed(format!("ciphertext is not base64: {e}")))?;

    let plaintext = Aes256CbcDec::new_from_slices(key.as_bytes(), iv)
        .map_err(|e| failed(format!("cipher init: {e}")))?
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| failed("bad padding or wrong key"))?;

    serde_json::from_slice(&plaintext).map_err(|e| failed(format!("plaintext is not json: {e}")))
}

fn failed(reason: impl Into<String>) -> DecryptError {
    DecryptError::DecryptionFailed(reason.into())
}

/// Wrap a packet in an envelope using a fresh random IV.
pub fn encrypt_packet(body: &Value, key: &EncryptKey) -> Value {
    encrypt_with_iv(body, key, rand::random())
}

/// Wrap a packet in an envelope using the given IV.
pub fn encrypt_with_iv(body: &Value, key: &EncryptKey, iv: [u8; IV_LEN]) -> Value {
    let plaintext = body.to_string();
    let ciphertext = Aes256CbcEnc::new(key.as_bytes().into(), &iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    let inner = BASE64.encode(ciphertext);
    let mut outer = Vec::with_capacity(IV_LEN + inner.len());
    outer.extend_from_slice(&iv);
    outer.extend_from_slice(inner.as_bytes());

    json!({ "encrypt": BASE64.encode(outer) })
}
