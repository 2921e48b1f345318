//! Webhook signature verification.
//!
//! Computes an HMAC over the raw request body with the shared secret and
//! compares it, in constant time, against the digest supplied in the
//! `X-Hub-Signature-256` or `X-Hub-Signature` header. Both HMAC-SHA256 and
//! the legacy HMAC-SHA1 are accepted; the algorithm is taken from the header
//! value prefix (`sha256=` or `sha1=`).

use crate::secret::{Secret, SecretError};
use crate::webhook::request::RequestHeaders;
use crate::ParseError;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

/// Header carrying an HMAC-SHA256 signature.
pub const SIGNATURE_256_HEADER: &str = "x-hub-signature-256";

/// Header carrying a legacy HMAC-SHA1 signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature";

/// Signature headers consulted by default, in lookup order.
pub const DEFAULT_SIGNATURE_HEADERS: [&str; 2] = [SIGNATURE_256_HEADER, SIGNATURE_HEADER];

// ============================================================================
// SignatureAlgorithm
// ============================================================================

/// Digest algorithm named in the signature header prefix.
///
/// | Variant  | Prefix    | Notes                         |
/// |----------|-----------|-------------------------------|
/// | `Sha1`   | `sha1=`   | Legacy `X-Hub-Signature`      |
/// | `Sha256` | `sha256=` | Current `X-Hub-Signature-256` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
    /// HMAC-SHA1, kept for backward compatibility.
    Sha1,

    /// HMAC-SHA256.
    Sha256,
}

impl SignatureAlgorithm {
    /// Header prefix name of the algorithm
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }

    /// Match a header prefix name exactly (`sha1` or `sha256`)
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sha1" => Some(Self::Sha1),
            "sha256" => Some(Self::Sha256),
            _ => None,
        }
    }

    /// Compute the keyed digest of `body`.
    fn digest(&self, key: &[u8], body: &[u8]) -> Result<Vec<u8>, SecretError> {
        let invalid_key = |e: hmac::digest::InvalidLength| SecretError::InvalidKey {
            message: e.to_string(),
        };

        let digest = match self {
            Self::Sha1 => {
                let mut mac = Hmac::<Sha1>::new_from_slice(key).map_err(invalid_key)?;
                mac.update(body);
                mac.finalize().into_bytes().to_vec()
            }
            Self::Sha256 => {
                let mut mac = Hmac::<Sha256>::new_from_slice(key).map_err(invalid_key)?;
                mac.update(body);
                mac.finalize().into_bytes().to_vec()
            }
        };

        Ok(digest)
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ParseError::InvalidFormat {
            expected: "sha1 or sha256".to_string(),
            actual: s.to_string(),
        })
    }
}

// ============================================================================
// SignatureResult
// ============================================================================

/// Why a verification attempt ended the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureReason {
    /// No secret configured; checking is disabled and the delivery is accepted
    /// without authentication.
    NoSecretConfigured,

    /// A secret is configured but no signature header was sent.
    HeaderMissing,

    /// The signature header is not `<algorithm>=<hex digest>` with a known
    /// algorithm and valid hex.
    HeaderMalformed,

    /// The digest does not match the body.
    Mismatch,

    /// The digest matches the body.
    Match,
}

impl SignatureReason {
    /// Stable snake_case name used in logs and responses
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoSecretConfigured => "no_secret_configured",
            Self::HeaderMissing => "header_missing",
            Self::HeaderMalformed => "header_malformed",
            Self::Mismatch => "mismatch",
            Self::Match => "match",
        }
    }

    /// Whether this outcome lets the delivery through
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::NoSecretConfigured | Self::Match)
    }
}

impl fmt::Display for SignatureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one verification attempt.
///
/// Created fresh per attempt and immutable afterwards. Carries neither the
/// secret nor the computed digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureResult {
    reason: SignatureReason,
    algorithm: Option<SignatureAlgorithm>,
    header: Option<String>,
}

impl SignatureResult {
    fn new(
        reason: SignatureReason,
        algorithm: Option<SignatureAlgorithm>,
        header: Option<&str>,
    ) -> Self {
        Self {
            reason,
            algorithm,
            header: header.map(str::to_string),
        }
    }

    /// Whether the delivery may be trusted (or checking is disabled)
    pub fn verified(&self) -> bool {
        self.reason.is_accepted()
    }

    /// Detailed outcome
    pub fn reason(&self) -> SignatureReason {
        self.reason
    }

    /// Algorithm named by the header, when one could be parsed
    pub fn algorithm(&self) -> Option<SignatureAlgorithm> {
        self.algorithm
    }

    /// Name of the header that was checked, when one was present
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    /// True only when a secret was configured and the digest matched.
    ///
    /// Distinguishes verified deliveries from those accepted because no
    /// secret is configured.
    pub fn is_authenticated(&self) -> bool {
        self.reason == SignatureReason::Match
    }
}

// ============================================================================
// Verification
// ============================================================================

/// Produce the signature header value (`"<algorithm>=<hex>"`) for `body`.
///
/// # Examples
///
/// ```rust
/// use hubhook_core::webhook::{compute_signature, SignatureAlgorithm};
/// use hubhook_core::Secret;
///
/// let sig = compute_signature(&Secret::from("key"), SignatureAlgorithm::Sha1, b"body").unwrap();
/// assert!(sig.starts_with("sha1="));
/// assert_eq!(sig.len(), "sha1=".len() + 40);
/// ```
///
/// # Errors
///
/// Returns [`SecretError::InvalidKey`] when the secret is rejected as an
/// HMAC key.
pub fn compute_signature(
    secret: &Secret,
    algorithm: SignatureAlgorithm,
    body: &[u8],
) -> Result<String, SecretError> {
    let digest = algorithm.digest(secret.expose_bytes(), body)?;
    Ok(format!("{}={}", algorithm.as_str(), hex::encode(digest)))
}

/// Verify `raw_body` against the default signature headers.
///
/// With no secret the result is always `NoSecretConfigured` and verified.
pub fn verify(secret: Option<&Secret>, raw_body: &[u8], headers: &RequestHeaders) -> SignatureResult {
    verify_with_headers(secret, raw_body, headers, &DEFAULT_SIGNATURE_HEADERS)
}

/// Verify `raw_body`, looking for the signature in the first present header
/// out of `header_names`.
pub fn verify_with_headers<S: AsRef<str>>(
    secret: Option<&Secret>,
    raw_body: &[u8],
    headers: &RequestHeaders,
    header_names: &[S],
) -> SignatureResult {
    let Some(secret) = secret else {
        return SignatureResult::new(SignatureReason::NoSecretConfigured, None, None);
    };

    let Some((header_name, value)) = header_names.iter().find_map(|name| {
        let name = name.as_ref();
        headers.get(name).map(|value| (name, value))
    }) else {
        debug!("No signature header present");
        return SignatureResult::new(SignatureReason::HeaderMissing, None, None);
    };

    // "<algorithm>=<hex digest>", split on the first '='
    let Some((algorithm_name, hex_digest)) = value.split_once('=') else {
        debug!(header = %header_name, "Signature header has no '=' separator");
        return SignatureResult::new(SignatureReason::HeaderMalformed, None, Some(header_name));
    };

    let Some(algorithm) = SignatureAlgorithm::from_name(algorithm_name) else {
        debug!(header = %header_name, "Signature header names an unsupported algorithm");
        return SignatureResult::new(SignatureReason::HeaderMalformed, None, Some(header_name));
    };

    let Ok(provided) = hex::decode(hex_digest) else {
        debug!(header = %header_name, algorithm = %algorithm, "Signature digest is not valid hex");
        return SignatureResult::new(
            SignatureReason::HeaderMalformed,
            Some(algorithm),
            Some(header_name),
        );
    };

    let expected = match algorithm.digest(secret.expose_bytes(), raw_body) {
        Ok(expected) => expected,
        Err(e) => {
            warn!(header = %header_name, error = %e, "Could not compute expected signature");
            return SignatureResult::new(
                SignatureReason::Mismatch,
                Some(algorithm),
                Some(header_name),
            );
        }
    };
    let reason = if constant_time_compare(&expected, &provided) {
        SignatureReason::Match
    } else {
        SignatureReason::Mismatch
    };

    SignatureResult::new(reason, Some(algorithm), Some(header_name))
}

/// Constant-time comparison of digests.
///
/// Length is compared first; digest lengths are public per algorithm.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Verifies deliveries against an optional shared secret.
///
/// # Examples
///
/// ```rust
/// use hubhook_core::{RequestHeaders, Secret, SignatureReason, SignatureVerifier};
///
/// let verifier = SignatureVerifier::new(Some(Secret::from("key")));
/// let result = verifier.verify(b"{}", &RequestHeaders::new());
/// assert_eq!(result.reason(), SignatureReason::HeaderMissing);
/// assert!(!result.verified());
/// ```
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Option<Secret>,
    header_names: Vec<String>,
}

impl SignatureVerifier {
    /// Create a verifier consulting the default signature headers.
    ///
    /// Passing `None` disables checking.
    pub fn new(secret: Option<Secret>) -> Self {
        Self {
            secret,
            header_names: DEFAULT_SIGNATURE_HEADERS
                .iter()
                .map(|h| h.to_string())
                .collect(),
        }
    }

    /// Replace the signature header lookup order
    pub fn with_header_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Whether a secret is configured
    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    /// Signature headers consulted, in lookup order
    pub fn header_names(&self) -> &[String] {
        &self.header_names
    }

    /// Verify a raw body against the captured headers
    pub fn verify(&self, raw_body: &[u8], headers: &RequestHeaders) -> SignatureResult {
        verify_with_headers(self.secret.as_ref(), raw_body, headers, &self.header_names)
    }
}

impl fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &self.secret.as_ref().map(|_| "<REDACTED>"))
            .field("header_names", &self.header_names)
            .finish()
    }
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
