//! # Hubhook Service
//!
//! Binary entry point for the hubhook HTTP service.
//!
//! This executable:
//! - Loads configuration from files and environment
//! - Initializes structured logging
//! - Resolves the webhook secret and builds the receiver
//! - Starts the HTTP server from hubhook-api

use hubhook_api::{start_server, LoggingConfig, LoggingDispatcher, ServiceConfig, ServiceError};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable naming an explicit configuration file
const CONFIG_FILE_ENV: &str = "HUBHOOK_CONFIG_FILE";

/// Prefix for configuration environment overrides
const ENV_PREFIX: &str = "HUBHOOK";

#[tokio::main]
async fn main() {
    // -------------------------------------------------------------------------
    // Load configuration
    //
    // Sources (applied in order, later sources override earlier ones):
    //  1. /etc/hubhook/service.yaml          system-wide defaults
    //  2. ./config/service.yaml              deployment-local override
    //  3. Path given by HUBHOOK_CONFIG_FILE  operator-specified file
    //  4. Environment variables prefixed HUBHOOK__ (double-underscore separator)
    //     e.g. HUBHOOK__SERVER__PORT=9090 sets server.port = 9090
    //
    // Logging is not initialized yet, so load failures go to stderr.
    // -------------------------------------------------------------------------
    let service_config = match load_configuration() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("hubhook: failed to load configuration: {}", e);
            std::process::exit(3);
        }
    };

    init_tracing(&service_config.logging);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting hubhook service");

    if let Err(e) = service_config.validate() {
        error!(
            error = %e,
            category = ?e.error_category(),
            "Service configuration is invalid; aborting"
        );
        std::process::exit(3);
    }

    // A configured but unresolvable secret is fatal, never unauthenticated mode.
    let receiver = match service_config.webhook.build_receiver() {
        Ok(receiver) => receiver,
        Err(e) => {
            error!(
                error = %e,
                category = ?e.error_category(),
                "Could not resolve webhook secret; aborting"
            );
            std::process::exit(3);
        }
    };

    info!(
        host = %service_config.server.host,
        port = service_config.server.port,
        endpoint = %service_config.webhook.endpoint_path,
        "Starting HTTP server"
    );

    if let Err(e) = start_server(service_config, receiver, Arc::new(LoggingDispatcher)).await {
        error!("Server failed: {}", e);

        let exit_code = match e {
            ServiceError::BindFailed { .. } => 1,
            ServiceError::ServerFailed { .. } => 2,
            ServiceError::Configuration(_) => 3,
        };

        std::process::exit(exit_code);
    }
}

// ============================================================================
// Private helpers
// ============================================================================

/// Build the layered service configuration.
///
/// Absent optional files are skipped. A malformed file, or an environment
/// value that cannot be coerced to the field type, is an error.
fn load_configuration() -> Result<ServiceConfig, config::ConfigError> {
    let mut config_builder = config::Config::builder()
        .add_source(
            config::File::with_name("/etc/hubhook/service")
                .required(false)
                .format(config::FileFormat::Yaml),
        )
        .add_source(
            config::File::with_name("config/service")
                .required(false)
                .format(config::FileFormat::Yaml),
        );

    if let Ok(explicit_path) = std::env::var(CONFIG_FILE_ENV) {
        if !explicit_path.is_empty() {
            config_builder =
                config_builder.add_source(config::File::with_name(&explicit_path).required(true));
        }
    }

    config_builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("webhook.signature_headers"),
        )
        .build()?
        .try_deserialize()
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    if logging.json_format {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
