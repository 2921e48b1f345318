//! Payload materialization.
//!
//! Turns the raw body of a delivery into a [`serde_json::Value`] tree based
//! on the declared content type. Two encodings are understood:
//!
//! - `application/json`: the body is the JSON document.
//! - `application/x-www-form-urlencoded`: the JSON document is the value of
//!   a single form field (`payload` by default).

use super::request::RawRequest;
use super::WebhookError;
use serde::{Deserialize, Serialize};
use percent_encoding::percent_decode;
use std::ops::Deref;
use tracing::debug;

/// Media type for JSON bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Media type for form-encoded bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Form field that carries the JSON document in form-encoded deliveries.
pub const DEFAULT_FORM_FIELD: &str = "payload";

/// Body encodings the parser understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Json,
    FormUrlEncoded,
}

impl ContentType {
    /// Classify a `Content-Type` header value.
    ///
    /// Only the media type before the first `;` is considered, trimmed of
    /// whitespace and matched case-sensitively. Parameters such as
    /// `charset` are ignored.
    pub fn from_header(value: &str) -> Option<Self> {
        let media_type = value.split(';').next().unwrap_or_default().trim();
        match media_type {
            JSON_CONTENT_TYPE => Some(Self::Json),
            FORM_CONTENT_TYPE => Some(Self::FormUrlEncoded),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => JSON_CONTENT_TYPE,
            Self::FormUrlEncoded => FORM_CONTENT_TYPE,
        }
    }
}

/// Decoded payload tree.
///
/// Only ever produced from a fully valid JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParsedPayload(serde_json::Value);

impl ParsedPayload {
    /// Borrow the decoded tree
    pub fn value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Take ownership of the decoded tree
    pub fn into_value(self) -> serde_json::Value {
        self.0
    }

    /// Names of the top-level keys when the document is an object
    pub fn top_level_keys(&self) -> Vec<&str> {
        self.0
            .as_object()
            .map(|map| map.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

impl Deref for ParsedPayload {
    type Target = serde_json::Value;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<serde_json::Value> for ParsedPayload {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

impl PartialEq<serde_json::Value> for ParsedPayload {
    fn eq(&self, other: &serde_json::Value) -> bool {
        &self.0 == other
    }
}

/// Decodes delivery bodies according to their declared content type.
///
/// # Examples
///
/// ```rust
/// use hubhook_core::{PayloadParser, RawRequest};
///
/// let raw = RawRequest::from_pairs(
///     [("Content-Type", "application/x-www-form-urlencoded")],
///     &b"payload=%7B%22a%22%3A1%7D"[..],
/// );
/// let payload = PayloadParser::default().parse(&raw).unwrap();
/// assert_eq!(payload["a"], 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadParser {
    form_field: String,
}

impl PayloadParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read form-encoded deliveries from a different field
    pub fn with_form_field(mut self, field: impl Into<String>) -> Self {
        self.form_field = field.into();
        self
    }

    pub fn form_field(&self) -> &str {
        &self.form_field
    }

    /// Decode the body of `raw` into a payload tree.
    ///
    /// Fails with `UnsupportedContentType` for any media type other than
    /// JSON or form-encoded (including a missing header) and with
    /// `MalformedPayload` when the JSON document is invalid or the form
    /// field is absent.
    pub fn parse(&self, raw: &RawRequest) -> Result<ParsedPayload, WebhookError> {
        let content_type = ContentType::from_header(raw.content_type()).ok_or_else(|| {
            WebhookError::UnsupportedContentType {
                content_type: raw.content_type().to_string(),
            }
        })?;

        debug!(content_type = %content_type.as_str(), bytes = raw.body().len(), "Decoding payload");

        let value = match content_type {
            ContentType::Json => decode_json(raw.body())?,
            ContentType::FormUrlEncoded => {
                let document = self.extract_form_field(raw.body())?;
                decode_json(&document)?
            }
        };

        Ok(ParsedPayload(value))
    }

    /// Raw bytes of the first `form_field` value.
    ///
    /// The value is percent-decoded to bytes without UTF-8 repair, so an
    /// invalid sequence reaches the JSON decoder and is rejected there.
    fn extract_form_field(&self, body: &[u8]) -> Result<Vec<u8>, WebhookError> {
        body.split(|b| *b == b'&')
            .filter(|pair| !pair.is_empty())
            .find_map(|pair| {
                let (name, value) = match pair.iter().position(|b| *b == b'=') {
                    Some(at) => (&pair[..at], &pair[at + 1..]),
                    None => (pair, &pair[pair.len()..]),
                };
                (form_decode(name) == self.form_field.as_bytes()).then(|| form_decode(value))
            })
            .ok_or_else(|| WebhookError::MalformedPayload {
                message: format!("form body has no '{}' field", self.form_field),
            })
    }
}

/// Decode one `application/x-www-form-urlencoded` component to bytes.
fn form_decode(component: &[u8]) -> Vec<u8> {
    let spaced: Vec<u8> = component
        .iter()
        .map(|b| if *b == b'+' { b' ' } else { *b })
        .collect();
    percent_decode(&spaced).collect()
}

impl Default for PayloadParser {
    fn default() -> Self {
        Self {
            form_field: DEFAULT_FORM_FIELD.to_string(),
        }
    }
}

fn decode_json(bytes: &[u8]) -> Result<serde_json::Value, WebhookError> {
    serde_json::from_slice(bytes).map_err(|e| WebhookError::MalformedPayload {
        message: format!("invalid JSON: {}", e),
    })
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
