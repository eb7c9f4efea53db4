//! KHL webhook - inbound endpoint for the KHL chat gateway.
//!
//! This library provides the validation pipeline and the HTTP ingress used by
//! the `khl-webhook` binary. It can also be mounted into an existing axum
//! application via [`web::router`].
//!
//! ## Architecture
//!
//! ```text
//! Gateway → HTTP ingress → WebhookPipeline → WebhookEvent channel → subscriber
//! ```

pub mod config;
pub mod crypto;
pub mod error;
pub mod pipeline;
pub mod protocol;
pub mod web;

// Re-export commonly used types
pub use config::{Config, PipelineConfig};
pub use crypto::EncryptKey;
pub use error::{ConfigError, DecryptError};
pub use pipeline::{EventReceiver, RoutingOutcome, WebhookEvent, WebhookPipeline};
pub use protocol::Packet;
pub use web::AppState;
