//! Structural validation and verify-token check.

use serde_json::Value;
use tracing::warn;

/// Decides whether a decoded body is a gateway packet addressed to us.
///
/// A `false` result is not an error: the endpoint may share a port with
/// unrelated traffic, and such bodies are simply passed on.
#[derive(Debug, Clone, Default)]
pub struct PacketVerifier {
    verify_token: Option<String>,
}

impl PacketVerifier {
    pub fn new(verify_token: Option<String>) -> Self {
        Self { verify_token }
    }

    /// Check shape (`s` numeric, `d` an object) and the verify token.
    pub fn is_structurally_valid(&self, body: &Value) -> bool {
        let Some(packet) = body.as_object() else {
            return false;
        };

        if !packet.get("s").is_some_and(Value::is_number) {
            return false;
        }

        let Some(payload) = packet.get("d").and_then(Value::as_object) else {
            return false;
        };

        if let Some(expected) = &self.verify_token {
            let provided = payload.get("verify_token").and_then(Value::as_str);
            match provided {
                Some(provided) if constant_time_compare(expected, provided) => {}
                _ => {
                    warn!(
                        has_verify_token = provided.is_some(),
                        "khl_verify_token_mismatch"
                    );
                    return false;
                }
            }
        }

        true
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
