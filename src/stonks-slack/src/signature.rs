//! Request signature verification for Events API deliveries.
//!
//! Slack signs every delivery with the app's signing secret:
//!
//! ```text
//! X-Slack-Request-Timestamp: 1531420618
//! X-Slack-Signature: v0=hex(HMAC-SHA256(secret, "v0:" + timestamp + ":" + body))
//! ```
//!
//! A delivery is accepted only when both headers are present, the timestamp
//! is within the allowed skew of the local clock, and the signature matches.
//! An empty secret turns verification off entirely.

use std::time::Duration;

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "x-slack-signature";

/// Header carrying the request timestamp (Unix seconds).
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Signature scheme version prefix.
const VERSION: &str = "v0";

/// Default tolerated difference between the request timestamp and now.
pub const DEFAULT_MAX_SKEW: Duration = Duration::from_secs(5 * 60);

/// Reasons a delivery fails verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// A required header is absent.
    #[error("missing header: {0}")]
    Missing(&'static str),

    /// Timestamp is outside the allowed window.
    #[error("timestamp expired: {age_secs}s from now exceeds {max_skew_secs}s")]
    Expired {
        /// Absolute distance between the request timestamp and now.
        age_secs: u64,
        /// Allowed distance.
        max_skew_secs: u64,
    },

    /// Headers are present but do not authenticate the body.
    #[error("invalid signature: {0}")]
    Invalid(String),

    /// Verification could not be carried out.
    #[error("signature verification failed: {0}")]
    Internal(String),
}

/// Outcome of a successful [`SignatureVerifier::verify`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Signature checked and valid.
    Verified,
    /// No secret configured; the delivery was not checked.
    Skipped,
}

/// Verifies Slack request signatures with a shared signing secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: SecretString,
    max_skew: Duration,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &"[REDACTED]")
            .field("enabled", &self.is_enabled())
            .field("max_skew", &self.max_skew)
            .finish()
    }
}

impl SignatureVerifier {
    /// Create a verifier. An empty secret disables verification.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into().into()),
            max_skew: DEFAULT_MAX_SKEW,
        }
    }

    /// Override the tolerated timestamp skew.
    pub fn with_max_skew(mut self, max_skew: Duration) -> Self {
        self.max_skew = max_skew;
        self
    }

    /// Whether deliveries are actually checked.
    pub fn is_enabled(&self) -> bool {
        !self.secret.expose_secret().is_empty()
    }

    /// Verify a delivery against the current time.
    pub fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<Verification, AuthError> {
        self.verify_at(headers, body, chrono::Utc::now().timestamp())
    }

    /// Verify a delivery as if the current time were `now` (Unix seconds).
    pub fn verify_at(
        &self,
        headers: &HeaderMap,
        body: &[u8],
        now: i64,
    ) -> Result<Verification, AuthError> {
        if !self.is_enabled() {
            return Ok(Verification::Skipped);
        }

        let signature = header_str(headers, SIGNATURE_HEADER)?;
        let timestamp = header_str(headers, TIMESTAMP_HEADER)?;

        let ts: i64 = timestamp
            .trim()
            .parse()
            .map_err(|_| AuthError::Invalid(format!("malformed timestamp: {timestamp:?}")))?;

        let age_secs = now.abs_diff(ts);
        let max_skew_secs = self.max_skew.as_secs();
        if age_secs > max_skew_secs {
            return Err(AuthError::Expired {
                age_secs,
                max_skew_secs,
            });
        }

        let provided = signature
            .strip_prefix(VERSION)
            .and_then(|s| s.strip_prefix('='))
            .ok_or_else(|| AuthError::Invalid("unsupported signature version".to_string()))?;
        let provided = hex::decode(provided)
            .map_err(|_| AuthError::Invalid("signature is not hex encoded".to_string()))?;

        // verify_slice compares in constant time.
        self.mac(ts, body)?
            .verify_slice(&provided)
            .map_err(|_| AuthError::Invalid("signature mismatch".to_string()))?;

        Ok(Verification::Verified)
    }

    /// Compute the `X-Slack-Signature` header value for a body.
    pub fn sign(&self, timestamp: i64, body: &[u8]) -> Result<String, AuthError> {
        let digest = self.mac(timestamp, body)?.finalize().into_bytes();
        Ok(format!("{VERSION}={}", hex::encode(digest)))
    }

    fn mac(&self, timestamp: i64, body: &[u8]) -> Result<HmacSha256, AuthError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        mac.update(format!("{VERSION}:{timestamp}:").as_bytes());
        mac.update(body);
        Ok(mac)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, AuthError> {
    let value = headers.get(name).ok_or(AuthError::Missing(name))?;
    let value = value
        .to_str()
        .map_err(|_| AuthError::Invalid(format!("{name} is not valid ASCII")))?;
    if value.is_empty() {
        return Err(AuthError::Missing(name));
    }
    Ok(value)
}
