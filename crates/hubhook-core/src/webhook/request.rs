//! Raw capture of an inbound webhook delivery.

use crate::Timestamp;
use bytes::Bytes;
use std::collections::HashMap;

/// Header carrying the hosted service's event name.
pub const EVENT_HEADER: &str = "x-github-event";

/// Header carrying the hosted service's unique delivery identifier.
pub const DELIVERY_HEADER: &str = "x-github-delivery";

/// Header declaring the body encoding.
pub const CONTENT_TYPE_HEADER: &str = "content-type";

/// Case-insensitive view over the request headers.
///
/// Names are lowercased on insertion. When a header appears more than once
/// the first value is kept, matching what most HTTP stacks return for a
/// single-value lookup.
///
/// # Examples
///
/// ```rust
/// use hubhook_core::RequestHeaders;
///
/// let headers = RequestHeaders::from_pairs([("X-Hub-Signature", "sha1=abc")]);
/// assert_eq!(headers.get("x-hub-signature"), Some("sha1=abc"));
/// assert_eq!(headers.get("X-HUB-SIGNATURE"), Some("sha1=abc"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    entries: HashMap<String, String>,
}

impl RequestHeaders {
    /// Create an empty header set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a header set from name/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut headers = Self::new();
        for (name, value) in pairs {
            headers.insert(name.as_ref(), value);
        }
        headers
    }

    /// Add a header unless one with the same name is already present
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.entries
            .entry(name.to_ascii_lowercase())
            .or_insert_with(|| value.into());
    }

    /// Look up a header value by name, ignoring case
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Check whether a header is present
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of distinct header names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no headers were captured
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(lowercased name, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for RequestHeaders
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

/// Unmodified body bytes and headers of one delivery, captured at receipt.
///
/// The body is never mutated after capture; signature verification runs on
/// exactly these bytes.
#[derive(Debug, Clone)]
pub struct RawRequest {
    headers: RequestHeaders,
    body: Bytes,
    content_type: String,
    received_at: Timestamp,
}

impl RawRequest {
    /// Capture a delivery.
    ///
    /// The declared content type is taken from the `Content-Type` header and
    /// is the empty string when the header is absent.
    pub fn new(headers: RequestHeaders, body: Bytes) -> Self {
        let content_type = headers
            .get(CONTENT_TYPE_HEADER)
            .unwrap_or_default()
            .to_string();

        Self {
            headers,
            body,
            content_type,
            received_at: Timestamp::now(),
        }
    }

    /// Capture a delivery from name/value header pairs
    pub fn from_pairs<I, K, V>(headers: I, body: impl Into<Bytes>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self::new(RequestHeaders::from_pairs(headers), body.into())
    }

    /// Raw body bytes as received
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Shared handle to the body bytes
    pub fn body_bytes(&self) -> Bytes {
        self.body.clone()
    }

    /// Captured headers
    pub fn headers(&self) -> &RequestHeaders {
        &self.headers
    }

    /// Look up a single header, ignoring case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Declared `Content-Type` value, parameters included
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Moment the delivery was captured
    pub fn received_at(&self) -> Timestamp {
        self.received_at
    }

    /// Event name from `X-GitHub-Event`, if sent
    pub fn event_name(&self) -> Option<&str> {
        self.headers.get(EVENT_HEADER)
    }

    /// Delivery identifier from `X-GitHub-Delivery`, if sent
    pub fn delivery_id(&self) -> Option<&str> {
        self.headers.get(DELIVERY_HEADER)
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
