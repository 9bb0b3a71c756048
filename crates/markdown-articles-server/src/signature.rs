//! Webhook signature verification (HMAC-SHA1 over the raw request body).
//!
//! Two header encodings are accepted: GitHub's `sha1=<hex digest>` and a bare
//! base64 digest.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha1 = Hmac<Sha1>;

const HEX_PREFIX: &str = "sha1=";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("Signature header {0} is missing")]
    MissingHeader(String),

    #[error("Signature header is not valid: {0}")]
    Malformed(String),

    #[error("Signature sent and signature generated do not match")]
    Mismatch,
}

/// Checks webhook payloads against a shared secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: String,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verifies `header` (the raw header value) against `payload`.
    pub fn verify(&self, payload: &[u8], header: &str) -> Result<(), SignatureError> {
        let provided = decode_header(header)?;
        let expected = compute_signature(&self.secret, payload);

        if constant_time_compare(&expected, &provided) {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Raw HMAC-SHA1 digest of `payload` keyed with `secret`.
pub fn compute_signature(secret: &str, payload: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Header value in GitHub's `sha1=<hex>` form.
pub fn hex_header(secret: &str, payload: &[u8]) -> String {
    format!("{HEX_PREFIX}{}", hex::encode(compute_signature(secret, payload)))
}

/// Header value as a bare base64 digest.
pub fn base64_header(secret: &str, payload: &[u8]) -> String {
    BASE64_STANDARD.encode(compute_signature(secret, payload))
}

fn decode_header(header: &str) -> Result<Vec<u8>, SignatureError> {
    let header = header.trim();

    match header.strip_prefix(HEX_PREFIX) {
        Some(digest) => hex::decode(digest)
            .map_err(|err| SignatureError::Malformed(format!("invalid hex digest: {err}"))),
        None => BASE64_STANDARD
            .decode(header)
            .map_err(|err| SignatureError::Malformed(format!("invalid base64 digest: {err}"))),
    }
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
