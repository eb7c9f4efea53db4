//! Subscriber notifications.
//!
//! The pipeline and its subscriber are connected by an unbounded channel that
//! is created together with the pipeline, so the subscriber exists before the
//! first request is served. Dropping the receiver unsubscribes.

use tokio::sync::mpsc;
use tracing::warn;

use crate::error::DecryptError;
use crate::protocol::Packet;

/// Notification delivered to the subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    /// A newly admitted packet.
    Message(Packet),
    /// A decrypt failure while decrypt errors are not ignored.
    Error(DecryptError),
}

/// Receiving half held by the subscriber.
pub type EventReceiver = mpsc::UnboundedReceiver<WebhookEvent>;

/// Sending half held by the pipeline.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<WebhookEvent>,
}

/// Create a connected sink and receiver.
pub fn channel() -> (EventSink, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink { tx }, rx)
}

impl EventSink {
    /// Send an event. Events sent after the subscriber is gone are discarded.
    pub fn emit(&self, event: WebhookEvent) {
        if self.tx.send(event).is_err() {
            warn!("khl_event_dropped_no_subscriber");
        }
    }
}
