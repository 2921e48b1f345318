//! Configuration types for the HTTP service

use crate::errors::ConfigError;
use hubhook_core::webhook::{DEFAULT_FORM_FIELD, DEFAULT_SIGNATURE_HEADERS};
use hubhook_core::{
    PayloadParser, SecretSource, SignatureVerifier, ValidationError, WebhookReceiver,
};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use tracing::{info, warn};

/// Service configuration
///
/// Every section carries defaults, so an empty document yields a valid
/// unauthenticated configuration listening on `0.0.0.0:8080`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Webhook intake settings
    pub webhook: WebhookConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Load a single configuration file.
    ///
    /// The format (yaml, json or toml) is taken from the file extension.
    /// The result is not validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config = ::config::Config::builder()
            .add_source(::config::File::from(path).required(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.webhook.validate()?;
        Ok(())
    }

    /// Copy of this configuration safe for display.
    ///
    /// Literal secret values are replaced with a placeholder.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if let Some(SecretSource::Literal { value }) = copy.webhook.secret.as_mut() {
            *value = "<REDACTED>".to_string();
        }
        copy
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// IP address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,

    /// Maximum request size in bytes
    pub max_body_size: usize,

    /// Enable permissive CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            timeout_seconds: 30,
            shutdown_timeout_seconds: 30,
            max_body_size: 10 * 1024 * 1024, // 10MB
            enable_cors: false,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.host.parse::<IpAddr>().is_err() {
            return Err(ValidationError::InvalidFormat {
                field: "server.host".to_string(),
                message: format!("'{}' is not an IP address", self.host),
            });
        }

        if self.port == 0 {
            return Err(ValidationError::InvalidFormat {
                field: "server.port".to_string(),
                message: "port must be non-zero".to_string(),
            });
        }

        if self.timeout_seconds == 0 {
            return Err(ValidationError::InvalidFormat {
                field: "server.timeout_seconds".to_string(),
                message: "timeout must be non-zero".to_string(),
            });
        }

        if self.max_body_size == 0 {
            return Err(ValidationError::InvalidFormat {
                field: "server.max_body_size".to_string(),
                message: "body limit must be non-zero".to_string(),
            });
        }

        Ok(())
    }

    /// Socket address the server listens on
    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.host.parse().map_err(|_| ConfigError::Invalid {
            message: format!("server.host '{}' is not an IP address", self.host),
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Webhook intake configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Webhook endpoint path
    pub endpoint_path: String,

    /// Form field carrying the JSON document in form-encoded deliveries
    pub form_field: String,

    /// Signature headers, in lookup order
    pub signature_headers: Vec<String>,

    /// Shared secret source; `None` disables signature checking
    pub secret: Option<SecretSource>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            endpoint_path: "/webhook".to_string(),
            form_field: DEFAULT_FORM_FIELD.to_string(),
            signature_headers: DEFAULT_SIGNATURE_HEADERS
                .iter()
                .map(|h| h.to_string())
                .collect(),
            secret: None,
        }
    }
}

impl WebhookConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.endpoint_path.starts_with('/') {
            return Err(ValidationError::InvalidFormat {
                field: "webhook.endpoint_path".to_string(),
                message: format!("'{}' must start with '/'", self.endpoint_path),
            });
        }

        if self.form_field.is_empty() {
            return Err(ValidationError::Required {
                field: "webhook.form_field".to_string(),
            });
        }

        if self.signature_headers.is_empty() {
            return Err(ValidationError::Required {
                field: "webhook.signature_headers".to_string(),
            });
        }

        if self.signature_headers.iter().any(|h| h.trim().is_empty()) {
            return Err(ValidationError::InvalidFormat {
                field: "webhook.signature_headers".to_string(),
                message: "header names must not be empty".to_string(),
            });
        }

        if let Some(secret) = &self.secret {
            secret.validate()?;
        }

        Ok(())
    }

    /// Resolve the secret and assemble the verify-then-decode pipeline.
    ///
    /// # Errors
    ///
    /// Fails when the configured secret cannot be resolved, for example when
    /// the named environment variable is unset or empty.
    pub fn build_receiver(&self) -> Result<WebhookReceiver, ConfigError> {
        let secret = match &self.secret {
            Some(source) => {
                let secret = source.resolve()?;
                info!(
                    secret_length = secret.len(),
                    "Webhook signature verification enabled"
                );
                Some(secret)
            }
            None => {
                warn!(
                    signature_mode = "unauthenticated",
                    "No webhook secret configured; signature checking is disabled"
                );
                None
            }
        };

        let verifier =
            SignatureVerifier::new(secret).with_header_names(self.signature_headers.clone());
        let parser = PayloadParser::new().with_form_field(self.form_field.clone());

        Ok(WebhookReceiver::with_components(verifier, parser))
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level or `EnvFilter` directive
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
