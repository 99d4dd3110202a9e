use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::{info, warn};

use crate::github::signature::{verify_signature, SIGNATURE_HEADER};
use crate::server::AppState;
use crate::webhooks::pull_request::SyncOutcome;

pub const SIGNATURE_MISMATCH: &str = "Signatures didn't match!";

/// `POST /github`. Anything that passes the signature check is answered
/// with 200, whatever happened downstream.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    if let Err(e) = verify_signature(&state.webhook_secret, &body, signature) {
        warn!("Rejecting webhook: {}", e);
        return (StatusCode::UNAUTHORIZED, SIGNATURE_MISMATCH).into_response();
    }

    let event_name = headers
        .get("X-GitHub-Event")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    info!("Received webhook: {} ({} bytes)", event_name, body.len());

    let outcome = state.router.handle_payload(&body).await;
    info!("Webhook outcome: {:?}", outcome);

    (StatusCode::OK, Json(outcome_body(&outcome))).into_response()
}

fn outcome_body(outcome: &SyncOutcome) -> serde_json::Value {
    match outcome {
        SyncOutcome::Ignored(reason) => json!({
            "status": outcome.status(),
            "reason": reason.to_string(),
        }),
        SyncOutcome::NotFound(id) => json!({
            "status": outcome.status(),
            "tracker_id": id.as_str(),
        }),
        SyncOutcome::Applied(steps) => json!({
            "status": outcome.status(),
            "completed": steps,
        }),
        SyncOutcome::PartialFailure { completed, failed } => json!({
            "status": outcome.status(),
            "completed": completed,
            "failed": failed,
        }),
    }
}
