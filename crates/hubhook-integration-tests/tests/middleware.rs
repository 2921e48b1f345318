//! Integration tests for middleware behaviour

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use hubhook_api::CORRELATION_ID_HEADER;
use tower::ServiceExt;

/// Verify that a caller-supplied correlation ID is echoed back
#[tokio::test]
async fn test_correlation_id_is_propagated() {
    let app = app_from_config(signed_config(), RecordingDispatcher::new());

    let mut request = signed_json_request(PING_BODY);
    request
        .headers_mut()
        .insert(CORRELATION_ID_HEADER, "delivery-trace-1".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CORRELATION_ID_HEADER).unwrap(),
        "delivery-trace-1"
    );
}

/// Verify that a correlation ID is generated when none is supplied
#[tokio::test]
async fn test_correlation_id_is_generated() {
    let app = app_from_config(signed_config(), RecordingDispatcher::new());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let id = response
        .headers()
        .get(CORRELATION_ID_HEADER)
        .expect("correlation id header should be set")
        .to_str()
        .unwrap();
    assert_eq!(id.len(), 36, "expected a UUID, got {}", id);
}

/// Verify that rejected deliveries still carry a correlation ID
#[tokio::test]
async fn test_correlation_id_on_rejection() {
    let app = app_from_config(signed_config(), RecordingDispatcher::new());

    let request = webhook_request(PING_BODY, "application/json", None);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(CORRELATION_ID_HEADER));
}

/// Verify that CORS headers are only added when enabled
#[tokio::test]
async fn test_cors_follows_configuration() {
    let preflight = || {
        Request::builder()
            .method("OPTIONS")
            .uri("/webhook")
            .header("origin", "https://example.com")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap()
    };

    let disabled = app_from_config(signed_config(), RecordingDispatcher::new());
    let response = disabled.oneshot(preflight()).await.unwrap();
    assert!(!response
        .headers()
        .contains_key("access-control-allow-origin"));

    let mut config = signed_config();
    config.server.enable_cors = true;
    let enabled = app_from_config(config, RecordingDispatcher::new());
    let response = enabled.oneshot(preflight()).await.unwrap();
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}

/// Verify that unknown paths are not routed to the webhook handler
#[tokio::test]
async fn test_unknown_path_returns_404() {
    let dispatcher = RecordingDispatcher::new();
    let app = app_from_config(signed_config(), dispatcher.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/other")
        .body(Body::from(PING_BODY))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(dispatcher.count(), 0);
}
