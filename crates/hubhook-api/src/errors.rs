//! Error types for the HTTP service

use crate::dispatch::DispatchError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use hubhook_core::{ErrorCategory, SecretError, ValidationError, WebhookError};
use tracing::{error, warn};

/// Webhook handler errors with HTTP status code mapping
///
/// - `401 Unauthorized`: signature missing, malformed or not matching
/// - `415 Unsupported Media Type`: body encoding not understood
/// - `400 Bad Request`: body could not be decoded
/// - `500 Internal Server Error`: the application failed to handle a
///   delivery that was otherwise valid
///
/// # Security Considerations
///
/// Error messages returned to clients never contain the shared secret or any
/// computed digest. Dispatch failures are logged server-side and reported to
/// the client with a generic message.
#[derive(Debug, thiserror::Error)]
pub enum WebhookHandlerError {
    /// Delivery rejected by the verify-then-decode pipeline
    #[error("{0}")]
    Rejected(#[from] WebhookError),

    /// Application handler failed for a verified, decoded delivery
    ///
    /// Maps to: `500 Internal Server Error`
    #[error("Event dispatch failed: {0}")]
    DispatchFailed(#[from] DispatchError),
}

impl WebhookHandlerError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Rejected(WebhookError::BadSignature { .. }) => StatusCode::UNAUTHORIZED,
            Self::Rejected(WebhookError::UnsupportedContentType { .. }) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            Self::Rejected(WebhookError::MalformedPayload { .. }) => StatusCode::BAD_REQUEST,
            Self::DispatchFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebhookHandlerError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match self {
            Self::Rejected(ref e) => {
                warn!(
                    error = %e,
                    category = ?e.error_category(),
                    status = status.as_u16(),
                    "Webhook delivery rejected"
                );
                e.to_string()
            }
            Self::DispatchFailed(ref e) => {
                // Log detailed error server-side but return generic message to client
                error!(error = %e, "Event dispatch failed");
                "Internal server error occurred. Please try again later.".to_string()
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        (status, Json(body)).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Webhook secret unavailable: {0}")]
    Secret(#[from] SecretError),

    #[error("Configuration loading failed: {0}")]
    Load(#[from] ::config::ConfigError),
}

impl ConfigError {
    /// Get error category for monitoring
    pub fn error_category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}
