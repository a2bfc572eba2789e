//! HTTP server for the alert webhook.

use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::pipeline::Pipeline;
use crate::types::WebhookPayload;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The alert-to-action pipeline.
    pub pipeline: Arc<Pipeline>,
    /// Notification dispatcher.
    pub notifier: Arc<notify::Notifier>,
}

/// Build the HTTP router for the remediation agent.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/alert", post(alert_handler))
        .route("/healthz", get(health_check))
        .route("/readyz", get(readiness_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness check endpoint.
async fn readiness_check() -> Json<Value> {
    Json(json!({ "status": "ready" }))
}

/// Handle an inbound Alertmanager webhook.
///
/// Malformed JSON and empty alert batches are client errors; a pipeline
/// failure is a server error, reported to the operator channel best-effort
/// before the response is returned.
async fn alert_handler(
    State(state): State<AppState>,
    payload: Result<Json<WebhookPayload>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected malformed alert payload");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": "error", "detail": "Invalid JSON" })),
            );
        }
    };

    if payload.alerts.is_empty() {
        warn!("No alerts found in payload");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": "error", "detail": "No alerts in payload" })),
        );
    }

    // Only the first alert of a batch is processed; the discard is a
    // documented simplification, surfaced in the logs.
    if payload.alerts.len() > 1 {
        warn!(
            discarded = payload.alerts.len() - 1,
            "Processing first alert only"
        );
    }
    let alert = &payload.alerts[0];

    match state.pipeline.handle(alert).await {
        Ok(report) => {
            let action = report.outcome.summary.clone();
            state.notifier.notify(report.to_event());
            info!(alert = report.alert_name, "Alert processed");
            (
                StatusCode::OK,
                Json(json!({ "status": "processed", "action": action })),
            )
        }
        Err(e) => {
            error!(alert = alert.name(), error = %e, "Alert pipeline failed");
            state.notifier.notify(notify::NotifyEvent::AgentError {
                message: e.to_string(),
                timestamp: chrono::Utc::now(),
            });
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "detail": "Internal processing error" })),
            )
        }
    }
}
