//! HTTP surface: the webhook endpoint the chat provider POSTs updates to,
//! plus a liveness probe.

use std::sync::Arc;

use anyhow::Context as _;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use intake_core::IntakeError;
use intake_handlers::WebhookValidator;
use intake_telegram::WebhookUpdate;
use serde_json::json;
use tracing::{error, info, warn};

/// State shared by the routes; cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub validator: Arc<WebhookValidator>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Binds `bind_addr` and serves until the process stops.
pub async fn serve(state: AppState, bind_addr: &str) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!("Webhook server listening on {}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Validation failures answer 400, everything else 500.
async fn handle_webhook(
    State(state): State<AppState>,
    Json(update): Json<WebhookUpdate>,
) -> impl IntoResponse {
    match state.validator.handle(&update).await {
        Ok(()) => (StatusCode::OK, Json(json!({"status": "ok"}))),
        Err(IntakeError::Validation(reason)) => {
            warn!(error = %reason, "rejected webhook update");
            (StatusCode::BAD_REQUEST, Json(json!({"error": reason})))
        }
        Err(e) => {
            error!(error = %e, "webhook processing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
        }
    }
}

async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}
