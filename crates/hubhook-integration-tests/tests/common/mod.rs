//! Common test utilities for hubhook-api integration tests
//!
//! This module provides:
//! - A dispatcher that records every event it is handed
//! - Builders for signed webhook requests
//! - Helpers for building the router from configuration

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use hubhook_api::{
    create_router, AppState, DispatchError, EventDispatcher, ServiceConfig, WebhookConfig,
};
use hubhook_core::webhook::compute_signature;
use hubhook_core::{Secret, SecretSource, SignatureAlgorithm, WebhookEvent};
use std::sync::{Arc, Mutex};

/// Shared secret used by every signed request in these tests
pub const TEST_SECRET: &str = "integration-test-secret";

pub const PING_BODY: &str = r#"{"zen":"Design for failure.","hook_id":42}"#;

// ============================================================================
// Recording Dispatcher
// ============================================================================

/// Dispatcher that stores accepted events for later inspection
#[derive(Clone, Default)]
pub struct RecordingDispatcher {
    events: Arc<Mutex<Vec<WebhookEvent>>>,
    fail_with: Option<String>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatcher whose handler always fails
    pub fn failing(message: &str) -> Self {
        Self {
            events: Arc::default(),
            fail_with: Some(message.to_string()),
        }
    }

    pub fn events(&self) -> Vec<WebhookEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl EventDispatcher for RecordingDispatcher {
    async fn dispatch(&self, event: WebhookEvent) -> Result<(), DispatchError> {
        self.events.lock().unwrap().push(event);

        match &self.fail_with {
            Some(message) => Err(DispatchError::HandlerFailed {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Application Builders
// ============================================================================

/// Configuration with a literal secret
pub fn signed_config() -> ServiceConfig {
    ServiceConfig {
        webhook: WebhookConfig {
            secret: Some(SecretSource::Literal {
                value: TEST_SECRET.to_string(),
            }),
            ..WebhookConfig::default()
        },
        ..ServiceConfig::default()
    }
}

/// Configuration without a secret
pub fn unsigned_config() -> ServiceConfig {
    ServiceConfig::default()
}

/// Build the router the way the service binary does
pub fn app_from_config(config: ServiceConfig, dispatcher: RecordingDispatcher) -> axum::Router {
    config.validate().expect("test configuration should be valid");
    let receiver = config
        .webhook
        .build_receiver()
        .expect("test secret should resolve");

    create_router(AppState::new(config, receiver, Arc::new(dispatcher)))
}

// ============================================================================
// Request Builders
// ============================================================================

/// `sha256=<hex>` for `body` under the test secret
pub fn sign(body: &[u8]) -> String {
    compute_signature(&Secret::from(TEST_SECRET), SignatureAlgorithm::Sha256, body).unwrap()
}

/// `sha1=<hex>` for `body` under the test secret
pub fn sign_sha1(body: &[u8]) -> String {
    compute_signature(&Secret::from(TEST_SECRET), SignatureAlgorithm::Sha1, body).unwrap()
}

/// POST to the default webhook path with GitHub-style delivery headers
pub fn webhook_request(
    body: impl Into<Vec<u8>>,
    content_type: &str,
    signature: Option<(&str, &str)>,
) -> Request<Body> {
    let body = body.into();
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", content_type)
        .header("x-github-event", "ping")
        .header("x-github-delivery", "72d3162e-cc78-11e3-81ab-4c9367dc0958");

    if let Some((name, value)) = signature {
        builder = builder.header(name, value);
    }

    builder.body(Body::from(body)).unwrap()
}

/// A JSON delivery signed with the test secret in `X-Hub-Signature-256`
pub fn signed_json_request(body: &str) -> Request<Body> {
    let signature = sign(body.as_bytes());
    webhook_request(
        body,
        "application/json",
        Some(("x-hub-signature-256", &signature)),
    )
}

/// Collect a response body as JSON
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
