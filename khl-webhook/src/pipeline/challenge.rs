//! Endpoint ownership handshake.

use crate::protocol::{ChallengeResponse, Packet};

/// Answer the handshake packet, or `None` if this is not one.
pub fn try_handle(packet: &Packet) -> Option<ChallengeResponse> {
    if !packet.is_challenge() {
        return None;
    }

    Some(ChallengeResponse {
        challenge: packet.d.get("challenge").cloned(),
    })
}
