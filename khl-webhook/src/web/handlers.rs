//! Webhook endpoint handlers.
//!
//! The handler only parses the body and maps the pipeline's outcome to a
//! response. All protocol decisions are made by [`WebhookPipeline`].

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::pipeline::{acknowledgment, ResponseBody, RoutingOutcome, WebhookPipeline};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<WebhookPipeline>,
}

impl AppState {
    pub fn new(pipeline: WebhookPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// KHL Webhook
// =============================================================================

/// KHL webhook endpoint.
///
/// The body is read as raw bytes so that non-JSON traffic is passed on
/// instead of being rejected by the extractor.
pub async fn khl_webhook(State(state): State<AppState>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, body_length = body.len(), "khl_webhook_not_json");
            Value::Null
        }
    };

    info!(
        body_length = body.len(),
        encrypted = crate::crypto::has_envelope(&payload),
        "khl_webhook_received"
    );

    state.pipeline.handle(payload).into_response()
}

impl IntoResponse for RoutingOutcome {
    fn into_response(self) -> Response {
        match self {
            RoutingOutcome::Continue => StatusCode::NOT_FOUND.into_response(),
            RoutingOutcome::Respond {
                status,
                body: ResponseBody::Json(body),
            } => (status, Json(body)).into_response(),
            RoutingOutcome::Respond {
                status,
                body: ResponseBody::Text(body),
            } => (status, body).into_response(),
            RoutingOutcome::EmitAndAcknowledge(_) => {
                (StatusCode::OK, Json(acknowledgment())).into_response()
            }
        }
    }
}
