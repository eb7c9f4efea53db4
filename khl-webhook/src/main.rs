//! KHL Webhook Server - receives gateway callbacks.
//!
//! This binary:
//! - Decrypts and verifies each callback
//! - Answers the endpoint handshake
//! - Drops replayed deliveries
//! - Hands admitted events to a subscriber task

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use khl_webhook::web::router;
use khl_webhook::{AppState, Config, EventReceiver, WebhookEvent, WebhookPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env().context("Invalid configuration")?;
    info!(
        port = config.port,
        webhook_path = %config.webhook_path,
        encrypt_key_configured = config.pipeline.key().is_some(),
        verify_token_configured = config.pipeline.verify_token().is_some(),
        ignore_decrypt_error = config.pipeline.ignore_decrypt_error(),
        "config_loaded"
    );

    // Subscribe before the first request can arrive
    let (pipeline, events) = WebhookPipeline::new(config.pipeline.clone());
    let subscriber = tokio::spawn(run_subscriber(events));

    let app = router(AppState::new(pipeline), &config.webhook_path)
        .layer(TraceLayer::new_for_http());

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // The router owned the last sender; the subscriber drains and exits
    if let Err(e) = subscriber.await {
        error!(error = %e, "subscriber_task_failed");
    }

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Consume pipeline events until every sender is gone.
async fn run_subscriber(mut events: EventReceiver) {
    while let Some(event) = events.recv().await {
        match event {
            WebhookEvent::Message(packet) => info!(
                sn = ?packet.sn,
                signal = %packet.s,
                event_type = ?packet.event_type(),
                channel_type = ?packet.channel_type(),
                "khl_message"
            ),
            WebhookEvent::Error(e) => error!(error = %e, "khl_webhook_error"),
        }
    }

    info!("subscriber_stopped");
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "sigint_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
