//! Hand-off of accepted deliveries to the embedding application.

use async_trait::async_trait;
use hubhook_core::WebhookEvent;
use tracing::info;

/// Errors raised by an application handler
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Event handler failed: {message}")]
    HandlerFailed { message: String },
}

/// Receives every delivery that passed signature checking and decoding.
///
/// Deciding what to do with a given event type is the implementor's concern.
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    async fn dispatch(&self, event: WebhookEvent) -> Result<(), DispatchError>;
}

/// Dispatcher that only records accepted deliveries in the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingDispatcher;

#[async_trait]
impl EventDispatcher for LoggingDispatcher {
    async fn dispatch(&self, event: WebhookEvent) -> Result<(), DispatchError> {
        let keys = event
            .payload()
            .map(|p| p.top_level_keys().join(","))
            .unwrap_or_default();

        info!(
            event = event.event_name().unwrap_or_default(),
            delivery_id = event.delivery_id().unwrap_or_default(),
            authenticated = event.is_authenticated(),
            payload_keys = %keys,
            "Webhook event accepted"
        );

        Ok(())
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
