//! # Hubhook Core
//!
//! Authenticity checks and payload decoding for inbound webhook deliveries.
//!
//! A delivery is captured once as a [`RawRequest`], verified against the
//! configured shared [`Secret`] with a keyed digest over the untouched body
//! bytes, and only then decoded into a structured value tree according to the
//! declared content type. The result is a [`WebhookEvent`] that the embedding
//! application consumes.
//!
//! ## Usage
//!
//! ```rust
//! use bytes::Bytes;
//! use hubhook_core::webhook::{compute_signature, RawRequest, SignatureAlgorithm, WebhookReceiver};
//! use hubhook_core::Secret;
//!
//! let secret = Secret::from("It's a Secret to Everybody");
//! let body = Bytes::from_static(br#"{"zen":"Design for failure."}"#);
//! let signature = compute_signature(&secret, SignatureAlgorithm::Sha256, &body).unwrap();
//!
//! let raw = RawRequest::from_pairs(
//!     [
//!         ("Content-Type", "application/json"),
//!         ("X-Hub-Signature-256", signature.as_str()),
//!     ],
//!     body,
//! );
//!
//! let receiver = WebhookReceiver::new(Some(secret));
//! let event = receiver.receive(raw).unwrap();
//! assert!(event.signature().verified());
//! assert_eq!(event.payload().unwrap()["zen"], "Design for failure.");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Time Types
// ============================================================================

/// UTC timestamp with microsecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create timestamp for current moment
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// High-level error categorization for alerting decisions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Permanent failures that won't succeed on retry
    Permanent,
    /// Security-related failures requiring attention
    Security,
    /// Configuration errors preventing startup
    Configuration,
}

/// Error type for input validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("Field '{field}' is required")]
    Required { field: String },

    #[error("Field '{field}' has invalid format: {message}")]
    InvalidFormat { field: String, message: String },
}

/// Error type for string parsing failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid format: expected {expected}, got '{actual}'")]
    InvalidFormat { expected: String, actual: String },
}

// ============================================================================
// Module declarations
// ============================================================================

/// Shared secret handling
pub mod secret;

/// Webhook capture, verification and decoding
pub mod webhook;

// Re-export key types for convenience
pub use secret::{Secret, SecretError, SecretSource};
pub use webhook::{
    ParsedPayload, PayloadParser, RawRequest, RequestHeaders, SignatureAlgorithm,
    SignatureReason, SignatureResult, SignatureVerifier, WebhookError, WebhookEvent,
    WebhookReceiver,
};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
