//! Shared secret handling.
//!
//! The shared secret is the HMAC key agreed between the hosted service and
//! this receiver. It is held in a zeroizing buffer, never printed by `Debug`,
//! and never interpolated into error messages.

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// Opaque shared secret used as the HMAC key for signature verification.
///
/// The bytes are wiped from memory when the value is dropped.
///
/// # Examples
///
/// ```rust
/// use hubhook_core::Secret;
///
/// let secret = Secret::from("my-webhook-secret");
/// assert_eq!(secret.len(), 17);
/// assert!(!format!("{:?}", secret).contains("my-webhook-secret"));
/// ```
#[derive(Clone)]
pub struct Secret {
    bytes: Zeroizing<Vec<u8>>,
}

impl Secret {
    /// Create a secret from raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Zeroizing::new(bytes.into()),
        }
    }

    /// Get the secret bytes (only for immediate use as a MAC key).
    pub fn expose_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get secret length without exposing content
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if secret is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes().to_vec())
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self::new(value.into_bytes())
    }
}

impl From<Vec<u8>> for Secret {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("length", &self.len())
            .field("value", &"<REDACTED>")
            .finish()
    }
}

/// Errors raised while resolving a configured secret.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("Secret environment variable not set: {variable}")]
    NotFound { variable: String },

    #[error("Secret from {source_kind} source is empty")]
    Empty { source_kind: String },

    #[error("Secret cannot be used as an HMAC key: {message}")]
    InvalidKey { message: String },
}

/// Where the shared secret comes from.
///
/// Deserialized from the `webhook.secret` section of the service
/// configuration:
///
/// ```yaml
/// secret:
///   source: env
///   variable: HUBHOOK_WEBHOOK_SECRET
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SecretSource {
    /// Secret embedded in configuration. Development use only.
    Literal { value: String },

    /// Secret read from an environment variable at startup.
    Env { variable: String },
}

impl SecretSource {
    /// Check the source definition without resolving it.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Literal { value } if value.is_empty() => Err(ValidationError::Required {
                field: "webhook.secret.value".to_string(),
            }),
            Self::Env { variable } if variable.trim().is_empty() => {
                Err(ValidationError::Required {
                    field: "webhook.secret.variable".to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Resolve the configured source into a [`Secret`].
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::NotFound`] when the environment variable is not
    /// set, and [`SecretError::Empty`] when the resolved value is empty.
    pub fn resolve(&self) -> Result<Secret, SecretError> {
        let (kind, value) = match self {
            Self::Literal { value } => ("literal", value.clone()),
            Self::Env { variable } => {
                let value = std::env::var(variable).map_err(|_| SecretError::NotFound {
                    variable: variable.clone(),
                })?;
                ("env", value)
            }
        };

        if value.is_empty() {
            return Err(SecretError::Empty {
                source_kind: kind.to_string(),
            });
        }

        Ok(Secret::from(value))
    }
}

impl fmt::Debug for SecretSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal { .. } => f
                .debug_struct("Literal")
                .field("value", &"<REDACTED>")
                .finish(),
            Self::Env { variable } => f.debug_struct("Env").field("variable", variable).finish(),
        }
    }
}

#[cfg(test)]
#[path = "secret_tests.rs"]
mod tests;
