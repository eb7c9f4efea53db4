//! Web server module for receiving gateway callbacks.
//!
//! This module provides:
//! - The webhook handler, which runs each body through the pipeline
//! - A health check
//! - [`router`], mountable into a host application that shares the port

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};

pub use handlers::{health, khl_webhook, AppState, HealthResponse};

/// Build the webhook routes.
///
/// Requests the pipeline does not claim are answered with 404, the same as
/// any other unknown route.
pub fn router(state: AppState, webhook_path: &str) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(webhook_path, post(khl_webhook))
        .with_state(state)
}
