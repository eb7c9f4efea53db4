//! KHL gateway protocol types.
//!
//! Every webhook callback carries a packet of the form
//! `{ "s": <signal>, "d": { ... }, "sn": <sequence> }`, optionally wrapped in
//! an encrypted envelope `{ "encrypt": "<base64>" }`.

pub mod types;

pub use types::{
    ChallengeResponse, Packet, CHALLENGE_CHANNEL_TYPE, CHALLENGE_EVENT_TYPE,
};
