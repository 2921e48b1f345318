//! # Hubhook CLI
//!
//! Offline tooling for signed webhook deliveries.
//!
//! This module provides CLI commands for:
//! - Signing a captured body the way the sending service does
//! - Verifying and decoding a captured delivery
//! - Validating and displaying service configuration

use clap::{Parser, Subcommand};
use hubhook_api::{ConfigError, ServiceConfig};
use hubhook_core::webhook::{
    compute_signature, PayloadParser, SignatureAlgorithm, SignatureVerifier,
    CONTENT_TYPE_HEADER, DEFAULT_FORM_FIELD, EVENT_HEADER, SIGNATURE_256_HEADER,
    SIGNATURE_HEADER,
};
use hubhook_core::{RawRequest, RequestHeaders, Secret, SecretError, SecretSource, WebhookError, WebhookReceiver};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// ============================================================================
// CLI Structure
// ============================================================================

/// hubhook - sign and verify webhook deliveries
#[derive(Parser, Debug)]
#[command(name = "hubhook")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sign and verify webhook deliveries")]
#[command(
    long_about = "Computes and checks keyed webhook signatures over captured request bodies, and validates hubhook service configuration"
)]
pub struct Cli {
    /// Logging level
    #[arg(short, long, default_value = "warn", global = true)]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the signature header value for a body
    Sign {
        #[command(flatten)]
        secret: SecretArgs,

        /// Digest algorithm
        #[arg(short, long, value_enum, default_value = "sha256")]
        algorithm: AlgorithmArg,

        /// Body file, or '-' for stdin
        input: PathBuf,
    },

    /// Verify and decode a captured delivery
    Verify {
        #[command(flatten)]
        secret: SecretArgs,

        /// Signature header value, e.g. 'sha256=...'
        #[arg(long)]
        signature: Option<String>,

        /// Header the signature was sent in; derived from the algorithm prefix when omitted
        #[arg(long)]
        signature_header: Option<String>,

        /// Declared content type of the body
        #[arg(long, default_value = "application/json")]
        content_type: String,

        /// Form field carrying the JSON document in form-encoded bodies
        #[arg(long, default_value = DEFAULT_FORM_FIELD)]
        form_field: String,

        /// Event name to record with the delivery
        #[arg(long)]
        event: Option<String>,

        /// Body file, or '-' for stdin
        input: PathBuf,
    },

    /// Validate configuration
    Config {
        /// Configuration file to validate
        #[arg(short, long, env = "HUBHOOK_CONFIG_FILE")]
        file: PathBuf,

        /// Show resolved configuration
        #[arg(short, long)]
        show: bool,

        /// Output format for configuration
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,
    },
}

/// Where the shared secret comes from on the command line
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SecretArgs {
    /// Shared secret (visible in process listings; prefer --secret-env)
    #[arg(long, conflicts_with = "secret_env")]
    pub secret: Option<String>,

    /// Environment variable holding the shared secret
    #[arg(long)]
    pub secret_env: Option<String>,
}

impl SecretArgs {
    /// Resolve the secret, `None` when neither flag was given
    pub fn resolve(&self) -> Result<Option<Secret>, CliError> {
        let source = match (&self.secret, &self.secret_env) {
            (Some(value), _) => SecretSource::Literal {
                value: value.clone(),
            },
            (None, Some(variable)) => SecretSource::Env {
                variable: variable.clone(),
            },
            (None, None) => return Ok(None),
        };

        Ok(Some(source.resolve()?))
    }
}

/// Digest algorithm options
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum AlgorithmArg {
    /// HMAC-SHA256
    Sha256,
    /// HMAC-SHA1 (legacy)
    Sha1,
}

impl From<AlgorithmArg> for SignatureAlgorithm {
    fn from(value: AlgorithmArg) -> Self {
        match value {
            AlgorithmArg::Sha256 => SignatureAlgorithm::Sha256,
            AlgorithmArg::Sha1 => SignatureAlgorithm::Sha1,
        }
    }
}

/// Configuration format options
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ConfigFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
    /// TOML format
    Toml,
}

// ============================================================================
// CLI Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Secret error: {0}")]
    Secret(#[from] SecretError),

    #[error("{0}")]
    Webhook(#[from] WebhookError),

    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output formatting failed: {message}")]
    Output { message: String },
}

impl CliError {
    /// Process exit code for this error
    ///
    /// | Code | Meaning                   |
    /// |------|---------------------------|
    /// | 2    | Signature rejected        |
    /// | 3    | Unsupported content type  |
    /// | 4    | Malformed payload         |
    /// | 1    | Anything else             |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Webhook(WebhookError::BadSignature { .. }) => 2,
            Self::Webhook(WebhookError::UnsupportedContentType { .. }) => 3,
            Self::Webhook(WebhookError::MalformedPayload { .. }) => 4,
            Self::Configuration(_)
            | Self::Secret(_)
            | Self::InvalidArgument { .. }
            | Self::Io(_)
            | Self::Output { .. } => 1,
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Main CLI entry point
pub fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();

    initialize_logging(&cli);

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    execute(cli.command, &mut stdin.lock(), &mut stdout.lock())
}

/// Run one command against the given input and output streams
pub fn execute(
    command: Commands,
    stdin: &mut dyn Read,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    match command {
        Commands::Sign {
            secret,
            algorithm,
            input,
        } => execute_sign_command(&secret, algorithm.into(), &input, stdin, out),
        Commands::Verify {
            secret,
            signature,
            signature_header,
            content_type,
            form_field,
            event,
            input,
        } => {
            let options = VerifyOptions {
                signature,
                signature_header,
                content_type,
                form_field,
                event,
            };
            execute_verify_command(&secret, &options, &input, stdin, out)
        }
        Commands::Config { file, show, format } => {
            execute_config_command(&file, show, format, out)
        }
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// Initialize logging based on CLI arguments
///
/// Logs go to stderr so command output on stdout stays machine-readable.
fn initialize_logging(cli: &Cli) {
    let filter = tracing_subscriber::EnvFilter::try_new(&cli.log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed when embedded; keep the existing one.
    let _ = if cli.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// Read the body from a file, or from `stdin` when the path is `-`
fn read_input(path: &Path, stdin: &mut dyn Read) -> Result<Vec<u8>, CliError> {
    let mut body = Vec::new();
    if path == Path::new("-") {
        stdin.read_to_end(&mut body)?;
    } else {
        body = std::fs::read(path)?;
    }
    debug!(path = %path.display(), bytes = body.len(), "Read input body");
    Ok(body)
}

/// Execute sign command
fn execute_sign_command(
    secret: &SecretArgs,
    algorithm: SignatureAlgorithm,
    input: &Path,
    stdin: &mut dyn Read,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let secret = secret.resolve()?.ok_or_else(|| CliError::InvalidArgument {
        arg: "--secret".to_string(),
        message: "a secret is required to sign (use --secret or --secret-env)".to_string(),
    })?;

    let body = read_input(input, stdin)?;
    let signature = compute_signature(&secret, algorithm, &body)?;

    info!(algorithm = %algorithm, bytes = body.len(), "Signed body");
    writeln!(out, "{}", signature)?;
    Ok(())
}

/// Delivery details for the verify command
#[derive(Debug, Clone)]
struct VerifyOptions {
    signature: Option<String>,
    signature_header: Option<String>,
    content_type: String,
    form_field: String,
    event: Option<String>,
}

impl VerifyOptions {
    /// Header the signature is presented in
    fn header_name(&self, signature: &str) -> String {
        match &self.signature_header {
            Some(name) => name.clone(),
            None if signature.starts_with("sha1=") => SIGNATURE_HEADER.to_string(),
            None => SIGNATURE_256_HEADER.to_string(),
        }
    }
}

/// Execute verify command
fn execute_verify_command(
    secret: &SecretArgs,
    options: &VerifyOptions,
    input: &Path,
    stdin: &mut dyn Read,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let secret = secret.resolve()?;
    let body = read_input(input, stdin)?;

    let mut headers = RequestHeaders::new();
    headers.insert(CONTENT_TYPE_HEADER, options.content_type.clone());
    if let Some(event) = &options.event {
        headers.insert(EVENT_HEADER, event.clone());
    }

    // Look only in the header the signature was placed in
    let mut verifier = SignatureVerifier::new(secret);
    if let Some(signature) = &options.signature {
        let header_name = options.header_name(signature);
        headers.insert(&header_name, signature.clone());
        verifier = verifier.with_header_names([header_name]);
    }

    let receiver = WebhookReceiver::with_components(
        verifier,
        PayloadParser::new().with_form_field(options.form_field.clone()),
    );

    let event = receiver.receive(RawRequest::new(headers, body.into()))?;

    writeln!(out, "signature: {}", event.signature().reason())?;
    if let Some(payload) = event.payload() {
        let pretty =
            serde_json::to_string_pretty(payload.value()).map_err(|e| CliError::Output {
                message: e.to_string(),
            })?;
        writeln!(out, "{}", pretty)?;
    }

    Ok(())
}

/// Execute config command
fn execute_config_command(
    file: &Path,
    show: bool,
    format: ConfigFormat,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let config = ServiceConfig::from_file(file)?;
    config.validate()?;

    info!(file = %file.display(), "Configuration is valid");
    writeln!(out, "Configuration valid: {}", file.display())?;

    if show {
        let shown = render_config(&config.redacted(), format)?;
        writeln!(out, "{}", shown.trim_end())?;
    }

    Ok(())
}

/// Serialize configuration in the requested format
fn render_config(config: &ServiceConfig, format: ConfigFormat) -> Result<String, CliError> {
    let rendered = match format {
        ConfigFormat::Yaml => serde_yaml::to_string(config).map_err(|e| e.to_string()),
        ConfigFormat::Json => serde_json::to_string_pretty(config).map_err(|e| e.to_string()),
        ConfigFormat::Toml => toml::to_string_pretty(config).map_err(|e| e.to_string()),
    };

    rendered.map_err(|message| CliError::Output { message })
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
