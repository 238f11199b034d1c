//! Webhook endpoint status-code contract tests.
//!
//! These run the real router with a lazily-connected pool pointing at an
//! unreachable database: every rejection path below must answer before any
//! database or relay work happens, so an unreachable pool proves the
//! ordering (e.g. a bad signature yields 401, never a publish attempt).

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use boxtrace_db::Database;
use boxtrace_ingest::publisher::RelayPublisher;
use boxtrace_ingest::signature::SignatureGate;
use boxtrace_ingest::{router, AppState, SIGNATURE_HEADER};

const TEST_SECRET: &str = "endpoint-test-secret";

fn test_state(with_gate: bool) -> AppState {
    // connect_lazy never touches the network until a query runs.
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy("postgres://unreachable.invalid/boxtrace")
        .expect("lazy pool construction should not fail");
    let db = Database::new(pool);
    AppState {
        publisher: Arc::new(RelayPublisher::new(db.clone())),
        gate: with_gate.then(|| Arc::new(SignatureGate::new(TEST_SECRET))),
        db,
    }
}

fn webhook_request(body: &[u8], signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhooks/notifications")
        .header("content-type", "application/json");
    if let Some(sig) = signature {
        builder = builder.header(SIGNATURE_HEADER, sig);
    }
    builder.body(Body::from(body.to_vec())).unwrap()
}

fn sign(body: &[u8]) -> String {
    SignatureGate::new(TEST_SECRET).sign(body)
}

#[tokio::test]
async fn test_non_post_method_is_405() {
    let app = router(test_state(true));
    let request = Request::builder()
        .method("GET")
        .uri("/webhooks/notifications")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_empty_body_is_400() {
    let app = router(test_state(true));
    let response = app.oneshot(webhook_request(b"", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_signature_is_401() {
    let app = router(test_state(true));
    let body = br#"{"data":{"type":"notification","attributes":{"event":"container.updated"}}}"#;
    let response = app.oneshot(webhook_request(body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_hex_signature_is_401_before_any_publish() {
    let app = router(test_state(true));
    let body = br#"{"data":{"type":"notification","attributes":{"event":"container.updated"}}}"#;
    // The pool is unreachable: reaching the publisher would produce a 500,
    // so a 401 here proves the gate rejected before any queue work.
    let response = app
        .oneshot(webhook_request(body, Some("not-hex")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_signature_is_401() {
    let app = router(test_state(true));
    let body = br#"{"data":{"type":"notification","attributes":{"event":"container.updated"}}}"#;
    let wrong = sign(b"some other body");
    let response = app
        .oneshot(webhook_request(body, Some(&wrong)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_json_is_400() {
    let app = router(test_state(true));
    let body = b"{not json";
    let sig = sign(body);
    let response = app
        .oneshot(webhook_request(body, Some(&sig)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_event_category_is_400() {
    let app = router(test_state(true));
    let body = br#"{"data":{"id":"n1","type":"notification","attributes":{}}}"#;
    let sig = sign(body);
    let response = app
        .oneshot(webhook_request(body, Some(&sig)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unconfigured_gate_refuses_traffic_with_503() {
    let app = router(test_state(false));
    let body = br#"{"data":{"type":"notification","attributes":{"event":"container.updated"}}}"#;
    let sig = sign(body);
    let response = app
        .oneshot(webhook_request(body, Some(&sig)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_publish_failure_surfaces_as_5xx() {
    // Valid signature and payload, but the pool is unreachable: the
    // publisher's bounded wait must surface a 5xx so the sender retries.
    let app = router(test_state(true));
    let body =
        br#"{"data":{"id":"n1","type":"notification","attributes":{"event":"container.updated"}}}"#;
    let sig = sign(body);
    let response = app
        .oneshot(webhook_request(body, Some(&sig)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_health_unhealthy_without_secret() {
    let app = router(test_state(false));
    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
