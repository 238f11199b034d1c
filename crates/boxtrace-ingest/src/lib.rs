//! # boxtrace-ingest
//!
//! HTTP surface for the inbound webhook path: signature gate, relay
//! publisher, and health check. The binary in `main.rs` wires this router
//! to a listener and boots the relay consumer.

pub mod publisher;
pub mod signature;

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, warn};
use uuid::Uuid;

use boxtrace_core::defaults::MAX_BODY_BYTES;
use boxtrace_core::NotificationDocument;
use boxtrace_db::Database;

use publisher::RelayPublisher;
use signature::SignatureGate;

/// Header carrying the hex HMAC-SHA256 signature.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Header carrying the correlation id (honored inbound, minted otherwise).
pub const REQUEST_ID_HEADER: &str = "x-request-id";

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically — useful for
/// correlating a webhook receipt with its relay message and consumer run.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Application state shared across handlers.
///
/// Every service here is constructed once at startup and injected — no
/// module-level singletons.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Signature gate; None when `WEBHOOK_SECRET` is unset, in which case
    /// webhook traffic is refused.
    pub gate: Option<Arc<SignatureGate>>,
    pub publisher: Arc<RelayPublisher>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/webhooks/notifications", post(receive_webhook))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Receive a webhook notification: verify, then relay.
///
/// Authentication and validation failures answer synchronously with 4xx and
/// are never enqueued; a publish failure answers 5xx so the sender retries.
async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::now_v7().to_string());

    // Fail closed: without a configured secret no webhook traffic is
    // accepted.
    let Some(gate) = &state.gate else {
        error!(
            subsystem = "ingest",
            %request_id, "Webhook received but WEBHOOK_SECRET is not configured"
        );
        return Err(ApiError::ServiceUnavailable(
            "signature verification not configured".to_string(),
        ));
    };

    if body.is_empty() {
        warn!(subsystem = "ingest", %request_id, "Empty request body");
        return Err(ApiError::BadRequest("Empty body".to_string()));
    }

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    if !gate.verify(&body, signature) {
        warn!(
            subsystem = "ingest",
            %request_id,
            signature_present = signature.is_some(),
            "Invalid signature"
        );
        return Err(ApiError::Unauthorized("Invalid signature".to_string()));
    }

    let doc: NotificationDocument = serde_json::from_slice(&body).map_err(|e| {
        warn!(
            subsystem = "ingest",
            %request_id,
            error = %e,
            body_len = body.len(),
            "Invalid JSON payload"
        );
        ApiError::BadRequest("Invalid JSON".to_string())
    })?;

    let Some(event_type) = doc.event() else {
        warn!(
            subsystem = "ingest",
            %request_id, "Missing event type in payload"
        );
        return Err(ApiError::BadRequest("Missing event type".to_string()));
    };

    let message_id = state
        .publisher
        .publish(&body, event_type, &request_id, doc.notification_id())
        .await
        .map_err(|e| {
            error!(
                subsystem = "ingest",
                %request_id,
                event_type,
                error = %e,
                "Failed to publish to relay"
            );
            ApiError::Internal("Failed to queue event".to_string())
        })?;

    Ok(Json(json!({
        "status": "ok",
        "message_id": message_id,
    })))
}

/// Health check: 200 with a checks map when required configuration is
/// present, 503 otherwise.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let secret_configured = state.gate.is_some();
    let database_configured = std::env::var("DATABASE_URL").is_ok();
    let healthy = secret_configured && database_configured;

    let configured = |ok: bool| if ok { "configured" } else { "missing" };
    let body = Json(json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "WEBHOOK_SECRET": configured(secret_configured),
            "DATABASE_URL": configured(database_configured),
        }
    }));

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, body)
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    BadRequest(String),
    ServiceUnavailable(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
