//! # Hubhook HTTP Service
//!
//! HTTP intake for signed webhook deliveries.
//!
//! This service provides:
//! - A webhook endpoint that verifies the delivery signature, decodes the
//!   payload and hands the resulting event to an [`EventDispatcher`]
//! - A health check endpoint reporting whether signatures are enforced

pub mod config;
pub mod dispatch;
pub mod errors;
pub mod responses;

pub use config::{LoggingConfig, ServerConfig, ServiceConfig, WebhookConfig};
pub use dispatch::{DispatchError, EventDispatcher, LoggingDispatcher};
pub use errors::{ConfigError, ServiceError, WebhookHandlerError};
pub use responses::{HealthResponse, SignatureMode, WebhookResponse};

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use hubhook_core::{RawRequest, RequestHeaders, Timestamp, WebhookReceiver};
use std::{future::IntoFuture, sync::Arc, time::Duration};
use tokio::sync::Notify;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info, instrument, warn};

/// Header used to correlate a delivery across log lines and the response
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: ServiceConfig,

    /// Verify-then-decode pipeline
    pub receiver: Arc<WebhookReceiver>,

    /// Application callback for accepted deliveries
    pub dispatcher: Arc<dyn EventDispatcher>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: ServiceConfig,
        receiver: WebhookReceiver,
        dispatcher: Arc<dyn EventDispatcher>,
    ) -> Self {
        Self {
            config,
            receiver: Arc::new(receiver),
            dispatcher,
        }
    }

    /// Signature mode reported by the health endpoint
    pub fn signature_mode(&self) -> SignatureMode {
        if self.receiver.verifier().has_secret() {
            SignatureMode::Verified
        } else {
            SignatureMode::Unauthenticated
        }
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;

    let mut router = Router::new()
        .route(&state.config.webhook.endpoint_path, post(handle_webhook))
        .route("/health", get(handle_health_check))
        .layer(DefaultBodyLimit::max(server.max_body_size))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_logging_middleware))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(server.timeout_seconds),
                ))
                .into_inner(),
        );

    if server.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router.with_state(state)
}

/// Start HTTP server
///
/// Runs until SIGINT or SIGTERM. In-flight requests are given
/// `server.shutdown_timeout_seconds` to complete after the signal.
pub async fn start_server(
    config: ServiceConfig,
    receiver: WebhookReceiver,
    dispatcher: Arc<dyn EventDispatcher>,
) -> Result<(), ServiceError> {
    let addr = config.server.bind_address()?;
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);

    let state = AppState::new(config, receiver, dispatcher);
    let signature_mode = state.signature_mode();
    let app = create_router(state);

    let listener =
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServiceError::BindFailed {
                address: addr.to_string(),
                message: e.to_string(),
            })?;

    info!(address = %addr, signature_mode = ?signature_mode, "Starting HTTP server");

    let shutdown_started = Arc::new(Notify::new());
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_started.clone(), shutdown_timeout))
        .into_future();

    let drain_deadline = async {
        shutdown_started.notified().await;
        tokio::time::sleep(shutdown_timeout).await;
    };

    tokio::select! {
        result = server => {
            result.map_err(|e| ServiceError::ServerFailed {
                message: e.to_string(),
            })?;
        }
        _ = drain_deadline => {
            warn!(
                timeout_seconds = shutdown_timeout.as_secs(),
                "Graceful shutdown timed out; abandoning in-flight requests"
            );
        }
    }

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM and notifies `started`.
async fn shutdown_signal(started: Arc<Notify>, timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown with {}s timeout", timeout.as_secs());
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown with {}s timeout", timeout.as_secs());
        },
    }

    started.notify_one();
}

// ============================================================================
// Webhook Handlers
// ============================================================================

/// Handle webhook deliveries
///
/// The body is captured exactly as received and verified before any
/// decoding. Only accepted deliveries reach the dispatcher.
#[instrument(skip(state, headers, body), fields(bytes = body.len()))]
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, WebhookHandlerError> {
    let raw = RawRequest::new(request_headers(&headers), body);

    let event = state.receiver.receive(raw)?;
    let response = WebhookResponse::accepted(&event);

    state.dispatcher.dispatch(event).await?;

    info!(
        event = response.event.as_deref().unwrap_or_default(),
        delivery_id = response.delivery_id.as_deref().unwrap_or_default(),
        signature = %response.signature,
        "Webhook delivery accepted"
    );

    Ok(Json(response))
}

/// Copy HTTP headers into the case-insensitive capture.
///
/// Bytes that are not valid UTF-8 are replaced, so a garbled header is still
/// present and fails its own checks instead of reading as absent.
fn request_headers(headers: &HeaderMap) -> RequestHeaders {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

// ============================================================================
// Health Check Handlers
// ============================================================================

/// Basic health check endpoint
#[instrument(skip(state))]
async fn handle_health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        signature_mode: state.signature_mode(),
        timestamp: Timestamp::now(),
    })
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging middleware with correlation ID tracking
///
/// This middleware:
/// - Extracts or generates correlation IDs for request tracking
/// - Logs request start and completion with structured fields
/// - Propagates correlation ID through response headers
#[instrument(skip(request, next), fields(
    method = %request.method(),
    uri = %request.uri(),
    correlation_id
))]
async fn request_logging_middleware(
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::Span::current().record("correlation_id", correlation_id.as_str());

    request.extensions_mut().insert(correlation_id.clone());

    info!(
        correlation_id = %correlation_id,
        method = %method,
        uri = %uri,
        "Request started"
    );

    let mut response = next.run(request).await;
    let duration = start.elapsed();

    if let Ok(header_value) = correlation_id.parse() {
        response
            .headers_mut()
            .insert(CORRELATION_ID_HEADER, header_value);
    }

    let status = response.status();

    // Log at appropriate level based on status code
    if status.is_server_error() {
        error!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        warn!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        info!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed successfully"
        );
    }

    response
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
