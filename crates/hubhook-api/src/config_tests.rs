//! Tests for [`ServiceConfig`] and its sections.

use super::*;
use serial_test::serial;
use std::io::Write;

// ============================================================================
// Defaults
// ============================================================================

#[test]
fn test_defaults_validate() {
    let config = ServiceConfig::default();

    assert!(config.validate().is_ok());
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.webhook.endpoint_path, "/webhook");
    assert_eq!(config.webhook.form_field, "payload");
    assert_eq!(
        config.webhook.signature_headers,
        vec!["x-hub-signature-256".to_string(), "x-hub-signature".to_string()]
    );
    assert!(config.webhook.secret.is_none());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_default_bind_address() {
    let addr = ServerConfig::default().bind_address().unwrap();
    assert_eq!(addr.to_string(), "0.0.0.0:8080");
}

// ============================================================================
// Validation
// ============================================================================

mod validation_tests {
    use super::*;

    fn assert_field_rejected(config: &ServiceConfig, field: &str) {
        match config.validate() {
            Err(ConfigError::Validation(ValidationError::Required { field: f }))
            | Err(ConfigError::Validation(ValidationError::InvalidFormat { field: f, .. })) => {
                assert_eq!(f, field)
            }
            other => panic!("expected validation error for {}, got {:?}", field, other),
        }
    }

    #[test]
    fn test_endpoint_path_must_be_absolute() {
        let mut config = ServiceConfig::default();
        config.webhook.endpoint_path = "webhook".to_string();
        assert_field_rejected(&config, "webhook.endpoint_path");
    }

    #[test]
    fn test_form_field_required() {
        let mut config = ServiceConfig::default();
        config.webhook.form_field = String::new();
        assert_field_rejected(&config, "webhook.form_field");
    }

    #[test]
    fn test_signature_headers_required() {
        let mut config = ServiceConfig::default();
        config.webhook.signature_headers.clear();
        assert_field_rejected(&config, "webhook.signature_headers");
    }

    #[test]
    fn test_blank_signature_header_rejected() {
        let mut config = ServiceConfig::default();
        config.webhook.signature_headers.push("  ".to_string());
        assert_field_rejected(&config, "webhook.signature_headers");
    }

    #[test]
    fn test_zero_port_rejected() {
        let mut config = ServiceConfig::default();
        config.server.port = 0;
        assert_field_rejected(&config, "server.port");
    }

    #[test]
    fn test_zero_body_limit_rejected() {
        let mut config = ServiceConfig::default();
        config.server.max_body_size = 0;
        assert_field_rejected(&config, "server.max_body_size");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = ServiceConfig::default();
        config.server.timeout_seconds = 0;
        assert_field_rejected(&config, "server.timeout_seconds");
    }

    #[test]
    fn test_hostname_rejected() {
        let mut config = ServiceConfig::default();
        config.server.host = "localhost".to_string();
        assert_field_rejected(&config, "server.host");
        assert!(matches!(
            config.server.bind_address(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_empty_literal_secret_rejected() {
        let mut config = ServiceConfig::default();
        config.webhook.secret = Some(SecretSource::Literal {
            value: String::new(),
        });
        assert_field_rejected(&config, "webhook.secret.value");
    }

    #[test]
    fn test_empty_env_variable_name_rejected() {
        let mut config = ServiceConfig::default();
        config.webhook.secret = Some(SecretSource::Env {
            variable: String::new(),
        });
        assert_field_rejected(&config, "webhook.secret.variable");
    }
}

// ============================================================================
// Receiver assembly
// ============================================================================

mod receiver_tests {
    use super::*;
    use hubhook_core::{ErrorCategory, RawRequest, SignatureReason, WebhookError};

    #[test]
    fn test_no_secret_builds_unauthenticated_receiver() {
        let receiver = WebhookConfig::default().build_receiver().unwrap();
        assert!(!receiver.verifier().has_secret());
        assert_eq!(receiver.parser().form_field(), "payload");
    }

    #[test]
    fn test_literal_secret_builds_verifying_receiver() {
        let config = WebhookConfig {
            secret: Some(SecretSource::Literal {
                value: "abc".to_string(),
            }),
            signature_headers: vec!["X-Custom-Signature".to_string()],
            form_field: "body".to_string(),
            ..Default::default()
        };

        let receiver = config.build_receiver().unwrap();
        assert!(receiver.verifier().has_secret());
        assert_eq!(receiver.verifier().header_names(), &["X-Custom-Signature".to_string()]);
        assert_eq!(receiver.parser().form_field(), "body");

        let raw = RawRequest::from_pairs([("Content-Type", "application/json")], &b"{}"[..]);
        assert_eq!(
            receiver.receive(raw).unwrap_err(),
            WebhookError::BadSignature {
                reason: SignatureReason::HeaderMissing
            }
        );
    }

    #[test]
    #[serial]
    fn test_env_secret_resolves() {
        std::env::set_var("HUBHOOK_CONFIG_TEST_SECRET", "from-env");
        let config = WebhookConfig {
            secret: Some(SecretSource::Env {
                variable: "HUBHOOK_CONFIG_TEST_SECRET".to_string(),
            }),
            ..Default::default()
        };

        let receiver = config.build_receiver();
        std::env::remove_var("HUBHOOK_CONFIG_TEST_SECRET");

        assert!(receiver.unwrap().verifier().has_secret());
    }

    #[test]
    #[serial]
    fn test_unset_env_secret_is_startup_error() {
        std::env::remove_var("HUBHOOK_CONFIG_TEST_UNSET");
        let config = WebhookConfig {
            secret: Some(SecretSource::Env {
                variable: "HUBHOOK_CONFIG_TEST_UNSET".to_string(),
            }),
            ..Default::default()
        };

        let error = config.build_receiver().unwrap_err();
        assert!(matches!(error, ConfigError::Secret(_)));
        assert_eq!(error.error_category(), ErrorCategory::Configuration);
    }
}

// ============================================================================
// Loading and serialization
// ============================================================================

mod loading_tests {
    use super::*;

    fn write_config(extension: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(extension)
            .tempfile()
            .expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn test_yaml_file_overrides_defaults() {
        let file = write_config(
            ".yaml",
            r#"
server:
  port: 9090
webhook:
  endpoint_path: /hooks/github
  secret:
    source: literal
    value: s3cret
"#,
        );

        let config = ServiceConfig::from_file(file.path()).unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.webhook.endpoint_path, "/hooks/github");
        assert_eq!(
            config.webhook.secret,
            Some(SecretSource::Literal {
                value: "s3cret".to_string()
            })
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_file_loads() {
        let file = write_config(
            ".toml",
            r#"
[webhook]
form_field = "data"

[webhook.secret]
source = "env"
variable = "HOOK_SECRET"
"#,
        );

        let config = ServiceConfig::from_file(file.path()).unwrap();
        assert_eq!(config.webhook.form_field, "data");
        assert_eq!(
            config.webhook.secret,
            Some(SecretSource::Env {
                variable: "HOOK_SECRET".to_string()
            })
        );
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let result = ServiceConfig::from_file(Path::new("/nonexistent/hubhook.yaml"));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_empty_document_deserializes_to_defaults() {
        let config: ServiceConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_redacted_hides_literal_secret() {
        let mut config = ServiceConfig::default();
        config.webhook.secret = Some(SecretSource::Literal {
            value: "hunter2".to_string(),
        });

        let shown = serde_json::to_string(&config.redacted()).unwrap();
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("<REDACTED>"));
    }

    #[test]
    fn test_debug_hides_literal_secret() {
        let mut config = ServiceConfig::default();
        config.webhook.secret = Some(SecretSource::Literal {
            value: "hunter2".to_string(),
        });

        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
