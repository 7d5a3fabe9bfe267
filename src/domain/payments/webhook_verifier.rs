//! Webhook signature verification.
//!
//! Validates that an inbound webhook payload genuinely originated from the
//! payment provider using HMAC-SHA256 over the exact raw request bytes, with
//! timestamp validation to bound replay-attack exposure. Pure validation, no
//! side effects.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::webhook_errors::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Default replay tolerance (5 minutes).
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Maximum allowed clock skew for future timestamps (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components of the `Payment-Signature` header.
///
/// Format: `t=<unix timestamp>,v1=<hex signature>[,v0=<legacy>]`. Unknown
/// keys are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp the provider signed along with the payload.
    pub timestamp: i64,

    /// v1 signature (HMAC-SHA256).
    pub v1_signature: Vec<u8>,

    /// Optional legacy v0 signature.
    pub v0_signature: Option<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses a signature header string.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::ParseError` if the header format is invalid.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<Vec<u8>> = None;
        let mut v0_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| WebhookError::ParseError("invalid header format".to_string()))?;

            match key.trim() {
                "t" => {
                    timestamp = Some(value.trim().parse().map_err(|_| {
                        WebhookError::ParseError("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    v1_signature = Some(hex::decode(value.trim()).map_err(|_| {
                        WebhookError::ParseError("invalid v1 signature hex".to_string())
                    })?);
                }
                "v0" => {
                    v0_signature = Some(hex::decode(value.trim()).map_err(|_| {
                        WebhookError::ParseError("invalid v0 signature hex".to_string())
                    })?);
                }
                _ => {
                    // Ignore unknown fields for forward compatibility
                }
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| WebhookError::ParseError("missing timestamp".to_string()))?;
        let v1_signature = v1_signature
            .ok_or_else(|| WebhookError::ParseError("missing v1 signature".to_string()))?;

        Ok(SignatureHeader {
            timestamp,
            v1_signature,
            v0_signature,
        })
    }
}

/// Verifier for payment-provider webhook signatures.
pub struct WebhookVerifier {
    /// Shared webhook signing secret.
    secret: SecretString,

    /// Maximum accepted age of the signed timestamp, in seconds.
    tolerance_secs: i64,
}

impl WebhookVerifier {
    /// Creates a verifier with the default 5-minute replay tolerance.
    pub fn new(secret: SecretString) -> Self {
        Self::with_tolerance(secret, DEFAULT_TOLERANCE_SECS)
    }

    /// Creates a verifier with an explicit replay tolerance.
    pub fn with_tolerance(secret: SecretString, tolerance_secs: i64) -> Self {
        Self {
            secret,
            tolerance_secs,
        }
    }

    /// Verifies the signature header against the exact raw payload bytes.
    ///
    /// # Verification steps
    ///
    /// 1. Parse the signature header
    /// 2. Validate the signed timestamp against the tolerance window
    /// 3. Compute HMAC-SHA256 over `"{timestamp}.{payload}"`
    /// 4. Compare signatures in constant time
    ///
    /// # Errors
    ///
    /// - `InvalidSignature` - signature mismatch
    /// - `StaleTimestamp` - signed timestamp older than the tolerance
    /// - `FutureTimestamp` - signed timestamp beyond clock skew tolerance
    /// - `ParseError` - malformed header
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> Result<(), WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;

        self.validate_timestamp(header.timestamp)?;

        let expected = self.compute_signature(header.timestamp, payload);
        if !constant_time_compare(&expected, &header.v1_signature) {
            return Err(WebhookError::InvalidSignature);
        }

        Ok(())
    }

    fn validate_timestamp(&self, timestamp: i64) -> Result<(), WebhookError> {
        let now = chrono::Utc::now().timestamp();
        let age = now - timestamp;

        if age > self.tolerance_secs {
            return Err(WebhookError::StaleTimestamp);
        }
        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(WebhookError::FutureTimestamp);
        }

        Ok(())
    }

    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Performs constant-time comparison of two byte slices.
///
/// Length is compared first; equal-length slices are compared without
/// data-dependent branching to avoid leaking signature prefixes through
/// timing.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Computes the hex-encoded signature for a payload.
///
/// The counterpart of [`WebhookVerifier::verify`]; used by test fixtures and
/// local provider simulation to produce valid `Payment-Signature` headers.
pub fn compute_signature_hex(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}
