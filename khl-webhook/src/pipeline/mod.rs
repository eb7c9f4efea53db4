//! Request validation pipeline.
//!
//! ## Processing Flow
//!
//! ```text
//! body → decrypt → verify → challenge? → acknowledge → dedup → emit
//! ```
//!
//! Each stage can end the request early. The pipeline never awaits, so a
//! request runs to completion once started.

pub mod challenge;
pub mod dedup;
pub mod events;
pub mod verifier;

use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::crypto;
use crate::protocol::Packet;

pub use dedup::{DuplicateSuppressor, DEDUP_WINDOW_MS};
pub use events::{EventReceiver, EventSink, WebhookEvent};
pub use verifier::PacketVerifier;

/// Body returned when a decrypt failure is not ignored.
pub const DECRYPT_ERROR_BODY: &str =
    "Not KHL request or bad encryption or unencrypted request";

/// Response body chosen by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(&'static str),
}

/// What the ingress should do with a request.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingOutcome {
    /// Not our packet; hand the request to the next handler.
    Continue,
    /// Answer with this body and status.
    Respond { status: StatusCode, body: ResponseBody },
    /// The packet was emitted to the subscriber; answer with the acknowledgment.
    EmitAndAcknowledge(Packet),
}

impl RoutingOutcome {
    /// The protocol's generic "received" answer: `1` with status 200.
    pub fn acknowledge() -> Self {
        RoutingOutcome::Respond {
            status: StatusCode::OK,
            body: ResponseBody::Json(acknowledgment()),
        }
    }
}

/// Acknowledgment body written for every verified, non-handshake packet.
pub fn acknowledgment() -> Value {
    json!(1)
}

/// Orchestrates the validation stages over each inbound request.
#[derive(Debug)]
pub struct WebhookPipeline {
    config: PipelineConfig,
    verifier: PacketVerifier,
    dedup: DuplicateSuppressor,
    events: EventSink,
}

impl WebhookPipeline {
    /// Build a pipeline together with the receiver its events go to.
    pub fn new(config: PipelineConfig) -> (Self, EventReceiver) {
        let (events, receiver) = events::channel();
        let pipeline = Self {
            verifier: PacketVerifier::new(config.verify_token().map(str::to_string)),
            dedup: DuplicateSuppressor::default(),
            config,
            events,
        };
        (pipeline, receiver)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run a request body through the pipeline using the wall clock.
    pub fn handle(&self, body: Value) -> RoutingOutcome {
        self.handle_at(body, now_ms())
    }

    /// Run a request body through the pipeline at time `now_ms`.
    pub fn handle_at(&self, body: Value, now_ms: u64) -> RoutingOutcome {
        let body = match self.open(body) {
            Ok(body) => body,
            Err(outcome) => return outcome,
        };

        if !self.verifier.is_structurally_valid(&body) {
            debug!("khl_packet_ignored");
            return RoutingOutcome::Continue;
        }

        // A verified body is ours from here on: every path below answers.
        let packet: Packet = match serde_json::from_value(body) {
            Ok(packet) => packet,
            Err(e) => {
                warn!(error = %e, "khl_packet_malformed");
                return RoutingOutcome::acknowledge();
            }
        };

        if let Some(response) = challenge::try_handle(&packet) {
            info!(has_challenge = response.challenge.is_some(), "khl_challenge_answered");
            return RoutingOutcome::Respond {
                status: StatusCode::OK,
                body: ResponseBody::Json(json!(response)),
            };
        }

        // Only unsigned integer sequence numbers are checked for replays.
        if let Some(sn) = packet.sequence() {
            if !self.dedup.admit(sn, now_ms) {
                info!(sn = sn, "khl_duplicate_dropped");
                return RoutingOutcome::acknowledge();
            }
        } else if packet.sn.is_some() {
            debug!(sn = ?packet.sn, "khl_sn_not_sequence");
        }

        info!(
            sn = ?packet.sn,
            ledger_size = self.dedup.ledger_size(),
            signal = %packet.s,
            event_type = ?packet.event_type(),
            channel_type = ?packet.channel_type(),
            "khl_event_admitted"
        );

        self.events.emit(WebhookEvent::Message(packet.clone()));
        RoutingOutcome::EmitAndAcknowledge(packet)
    }

    /// Decrypt stage. `Err` carries the outcome that ends the request.
    fn open(&self, body: Value) -> Result<Value, RoutingOutcome> {
        let key = self.config.key();
        if key.is_none() && !crypto::has_envelope(&body) {
            return Ok(body);
        }

        let ignore = self.config.ignore_decrypt_error();
        match crypto::decrypt(body, key, ignore) {
            Ok(body) => Ok(body),
            Err(e) if ignore => {
                debug!(error = %e, "khl_decrypt_ignored");
                Err(RoutingOutcome::Continue)
            }
            Err(e) => {
                warn!(error = %e, "khl_decrypt_failed");
                self.events.emit(WebhookEvent::Error(e));
                Err(RoutingOutcome::Respond {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: ResponseBody::Text(DECRYPT_ERROR_BODY),
                })
            }
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
