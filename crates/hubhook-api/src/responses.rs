//! Response types for the API.

use hubhook_core::{SignatureReason, Timestamp, WebhookEvent};
use serde::{Deserialize, Serialize};

// ============================================================================
// Response Types
// ============================================================================

/// Webhook acceptance response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub status: String,
    pub authenticated: bool,
    pub signature: SignatureReason,
    pub event: Option<String>,
    pub delivery_id: Option<String>,
}

impl WebhookResponse {
    pub fn accepted(event: &WebhookEvent) -> Self {
        Self {
            status: "accepted".to_string(),
            authenticated: event.is_authenticated(),
            signature: event.signature().reason(),
            event: event.event_name().map(str::to_string),
            delivery_id: event.delivery_id().map(str::to_string),
        }
    }
}

/// How deliveries are checked by this instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureMode {
    /// A secret is configured; unsigned deliveries are rejected
    Verified,

    /// No secret configured; every delivery is accepted unchecked
    Unauthenticated,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub signature_mode: SignatureMode,
    pub timestamp: Timestamp,
}
