//! # Webhook Processing Module
//!
//! Verifies and decodes inbound webhook deliveries.
//!
//! Processing is strictly ordered: the signature is checked on the raw body
//! first and the body is decoded only when that check passes. A rejected
//! delivery is never decoded.

use crate::secret::Secret;
use crate::ErrorCategory;
use tracing::{info, warn};

pub mod payload;
pub mod request;
pub mod signature;

pub use payload::{
    ContentType, ParsedPayload, PayloadParser, DEFAULT_FORM_FIELD, FORM_CONTENT_TYPE,
    JSON_CONTENT_TYPE,
};
pub use request::{RawRequest, RequestHeaders, CONTENT_TYPE_HEADER, DELIVERY_HEADER, EVENT_HEADER};
pub use signature::{
    compute_signature, verify, verify_with_headers, SignatureAlgorithm, SignatureReason,
    SignatureResult, SignatureVerifier, DEFAULT_SIGNATURE_HEADERS, SIGNATURE_256_HEADER,
    SIGNATURE_HEADER,
};

// ============================================================================
// Errors
// ============================================================================

/// Reasons a delivery is rejected.
///
/// Messages never include the shared secret or any computed digest.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WebhookError {
    #[error("Webhook signature rejected: {reason}")]
    BadSignature { reason: SignatureReason },

    #[error("Unsupported content type: '{content_type}'")]
    UnsupportedContentType { content_type: String },

    #[error("Malformed payload: {message}")]
    MalformedPayload { message: String },
}

impl WebhookError {
    /// Check if error is transient and should be retried
    ///
    /// Resending the same bytes always fails the same way.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::BadSignature { .. } => false,
            Self::UnsupportedContentType { .. } => false,
            Self::MalformedPayload { .. } => false,
        }
    }

    /// Get error category for monitoring
    pub fn error_category(&self) -> ErrorCategory {
        match self {
            Self::BadSignature { .. } => ErrorCategory::Security,
            Self::UnsupportedContentType { .. } => ErrorCategory::Permanent,
            Self::MalformedPayload { .. } => ErrorCategory::Permanent,
        }
    }
}

// ============================================================================
// WebhookEvent
// ============================================================================

/// A delivery that passed signature checking.
///
/// Owns the raw capture, the verification outcome and, unless produced by
/// [`WebhookReceiver::authenticate`], the decoded payload.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    raw: RawRequest,
    signature: SignatureResult,
    payload: Option<ParsedPayload>,
}

impl WebhookEvent {
    /// Raw capture the event was built from
    pub fn raw(&self) -> &RawRequest {
        &self.raw
    }

    /// Raw body bytes exactly as received
    pub fn body(&self) -> &[u8] {
        self.raw.body()
    }

    /// Signature verification outcome
    pub fn signature(&self) -> &SignatureResult {
        &self.signature
    }

    /// Decoded payload, absent for authenticate-only events
    pub fn payload(&self) -> Option<&ParsedPayload> {
        self.payload.as_ref()
    }

    /// Event name from `X-GitHub-Event`
    pub fn event_name(&self) -> Option<&str> {
        self.raw.event_name()
    }

    /// Delivery identifier from `X-GitHub-Delivery`
    pub fn delivery_id(&self) -> Option<&str> {
        self.raw.delivery_id()
    }

    /// True when a secret was configured and the signature matched
    pub fn is_authenticated(&self) -> bool {
        self.signature.is_authenticated()
    }

    pub fn into_parts(self) -> (RawRequest, SignatureResult, Option<ParsedPayload>) {
        (self.raw, self.signature, self.payload)
    }
}

// ============================================================================
// WebhookReceiver
// ============================================================================

/// Verify-then-decode pipeline for webhook deliveries.
///
/// Immutable after construction and safe to share between request handlers.
///
/// # Examples
///
/// ```rust
/// use hubhook_core::{RawRequest, SignatureReason, WebhookError, WebhookReceiver};
///
/// let receiver = WebhookReceiver::new(Some("key".into()));
/// let raw = RawRequest::from_pairs([("Content-Type", "application/json")], &b"{}"[..]);
///
/// match receiver.receive(raw) {
///     Err(WebhookError::BadSignature { reason }) => {
///         assert_eq!(reason, SignatureReason::HeaderMissing)
///     }
///     other => panic!("unexpected: {:?}", other),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct WebhookReceiver {
    verifier: SignatureVerifier,
    parser: PayloadParser,
}

impl WebhookReceiver {
    /// Create a receiver with default signature headers and form field.
    ///
    /// `None` runs in unauthenticated mode: every delivery passes the
    /// signature stage with [`SignatureReason::NoSecretConfigured`].
    pub fn new(secret: Option<Secret>) -> Self {
        Self::with_components(SignatureVerifier::new(secret), PayloadParser::default())
    }

    pub fn with_components(verifier: SignatureVerifier, parser: PayloadParser) -> Self {
        Self { verifier, parser }
    }

    pub fn verifier(&self) -> &SignatureVerifier {
        &self.verifier
    }

    pub fn parser(&self) -> &PayloadParser {
        &self.parser
    }

    /// Verify the signature without decoding the body.
    ///
    /// The returned event has no payload.
    pub fn authenticate(&self, raw: RawRequest) -> Result<WebhookEvent, WebhookError> {
        let signature = self.verifier.verify(raw.body(), raw.headers());

        match signature.reason() {
            SignatureReason::Match => {
                info!(
                    event = raw.event_name().unwrap_or_default(),
                    delivery_id = raw.delivery_id().unwrap_or_default(),
                    algorithm = signature.algorithm().map(|a| a.as_str()).unwrap_or_default(),
                    "Webhook signature verified"
                );
            }
            SignatureReason::NoSecretConfigured => {
                warn!(
                    event = raw.event_name().unwrap_or_default(),
                    delivery_id = raw.delivery_id().unwrap_or_default(),
                    signature_mode = "unauthenticated",
                    "Accepting webhook without signature check; no secret configured"
                );
            }
            reason => {
                warn!(
                    event = raw.event_name().unwrap_or_default(),
                    delivery_id = raw.delivery_id().unwrap_or_default(),
                    reason = %reason,
                    header = signature.header().unwrap_or_default(),
                    "Webhook signature rejected"
                );
                return Err(WebhookError::BadSignature { reason });
            }
        }

        Ok(WebhookEvent {
            raw,
            signature,
            payload: None,
        })
    }

    /// Verify the signature, then decode the body.
    pub fn receive(&self, raw: RawRequest) -> Result<WebhookEvent, WebhookError> {
        let mut event = self.authenticate(raw)?;

        let payload = self.parser.parse(&event.raw).inspect_err(|e| {
            warn!(
                event = event.raw.event_name().unwrap_or_default(),
                delivery_id = event.raw.delivery_id().unwrap_or_default(),
                content_type = %event.raw.content_type(),
                error = %e,
                "Webhook payload rejected"
            );
        })?;

        event.payload = Some(payload);
        Ok(event)
    }
}

/// Verify and decode a single delivery with default settings.
pub fn receive(secret: Option<&Secret>, raw: RawRequest) -> Result<WebhookEvent, WebhookError> {
    WebhookReceiver::new(secret.cloned()).receive(raw)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
