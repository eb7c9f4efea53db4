//! Packet and response shapes exchanged with the gateway.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// `d.type` value of the handshake packet.
pub const CHALLENGE_EVENT_TYPE: u64 = 255;

/// `d.channel_type` value of the handshake packet.
pub const CHALLENGE_CHANNEL_TYPE: &str = "WEBHOOK_CHALLENGE";

/// A decoded gateway packet.
///
/// Only `s`, `d` and `sn` are interpreted. Any other top-level field is kept
/// in `extra` so the packet reaches the subscriber exactly as it was sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    /// Signal type
    pub s: Number,
    /// Event payload
    pub d: Map<String, Value>,
    /// Sequence number, kept as sent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sn: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Packet {
    /// `sn` as a replay-suppression key, if it is an unsigned integer.
    pub fn sequence(&self) -> Option<u64> {
        self.sn.as_ref().and_then(Value::as_u64)
    }

    /// `d.type`, if it is an unsigned integer.
    pub fn event_type(&self) -> Option<u64> {
        self.d.get("type").and_then(Value::as_u64)
    }

    /// `d.channel_type`, if it is a string.
    pub fn channel_type(&self) -> Option<&str> {
        self.d.get("channel_type").and_then(Value::as_str)
    }

    /// True for the one-time endpoint ownership handshake.
    pub fn is_challenge(&self) -> bool {
        let type_matches = self
            .d
            .get("type")
            .and_then(Value::as_f64)
            .is_some_and(|t| t == CHALLENGE_EVENT_TYPE as f64);

        type_matches && self.channel_type() == Some(CHALLENGE_CHANNEL_TYPE)
    }
}

/// Body returned for a handshake packet.
///
/// A handshake without a `challenge` field serializes to `{}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_packet_keeps_unknown_fields() {
        let raw = json!({
            "s": 0,
            "d": {"type": 1, "content": "hi"},
            "sn": 42,
            "extra_field": "kept"
        });

        let packet: Packet = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(packet.sequence(), Some(42));
        assert_eq!(packet.event_type(), Some(1));
        assert_eq!(packet.extra.get("extra_field"), Some(&json!("kept")));

        assert_eq!(serde_json::to_value(&packet).unwrap(), raw);
    }

    #[test]
    fn test_packet_without_sn() {
        let packet: Packet = serde_json::from_value(json!({"s": 0, "d": {}})).unwrap();
        assert_eq!(packet.sn, None);
        assert_eq!(packet.sequence(), None);
        assert!(!serde_json::to_string(&packet).unwrap().contains("sn"));
    }

    #[test]
    fn test_non_integer_sn_kept_verbatim() {
        for sn in [json!(-1), json!(1.5), json!("7")] {
            let raw = json!({"s": 0, "d": {}, "sn": sn});
            let packet: Packet = serde_json::from_value(raw.clone()).unwrap();
            assert_eq!(packet.sequence(), None);
            assert_eq!(serde_json::to_value(&packet).unwrap(), raw);
        }
    }

    #[test]
    fn test_is_challenge() {
        let packet: Packet = serde_json::from_value(json!({
            "s": 0,
            "d": {"type": 255, "channel_type": "WEBHOOK_CHALLENGE", "challenge": "abc"}
        }))
        .unwrap();
        assert!(packet.is_challenge());

        let packet: Packet = serde_json::from_value(json!({
            "s": 0,
            "d": {"type": 255, "channel_type": "GROUP"}
        }))
        .unwrap();
        assert!(!packet.is_challenge());

        let packet: Packet = serde_json::from_value(json!({
            "s": 0,
            "d": {"type": "255", "channel_type": "WEBHOOK_CHALLENGE"}
        }))
        .unwrap();
        assert!(!packet.is_challenge());
    }

    #[test]
    fn test_challenge_response_serialization() {
        let resp = ChallengeResponse {
            challenge: Some(json!("abc")),
        };
        assert_eq!(serde_json::to_string(&resp).unwrap(), r#"{"challenge":"abc"}"#);

        let empty = ChallengeResponse { challenge: None };
        assert_eq!(serde_json::to_string(&empty).unwrap(), "{}");
    }
}
