//! Worker callback verification.
//!
//! Trusted workers (transcoding, background jobs) call back into the
//! platform with an HMAC-SHA256 signature of the raw request body in the
//! [`X_SIGNATURE`] header, keyed by a shared secret. This path never touches
//! session state.

use axum::http::{HeaderMap, header::HeaderName};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use atelier_core::auth::WorkerVerifier;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded HMAC-SHA256 body signature.
pub static X_SIGNATURE: HeaderName = HeaderName::from_static("x-atelier-signature");

/// Request extension inserted by upstream middleware once a request has
/// already been worker-authenticated.
///
/// The enforcer honors this marker and skips re-verification.
#[derive(Debug, Clone, Copy)]
pub struct WorkerAuthenticated;

/// Verifies worker signatures against a shared secret.
///
/// With no secret configured, verification always fails.
pub struct SharedSecretVerifier {
    secret: Option<String>,
}

impl SharedSecretVerifier {
    /// Creates a verifier over the given shared secret.
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }

    /// Computes the expected hex signature for a body.
    pub fn sign(secret: &str, body: &[u8]) -> String {
        // HmacSha256::new_from_slice accepts keys of any length.
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }
}

impl WorkerVerifier for SharedSecretVerifier {
    fn verify(&self, headers: &HeaderMap, body: &[u8]) -> bool {
        let Some(secret) = &self.secret else {
            debug!("worker verification attempted with no secret configured");
            return false;
        };

        let Some(presented) = headers.get(&X_SIGNATURE).and_then(|v| v.to_str().ok()) else {
            return false;
        };
        let Ok(presented_bytes) = hex::decode(presented) else {
            return false;
        };

        // Compare through the Mac verifier for constant-time behavior.
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(body);
        let verified = mac.verify_slice(&presented_bytes).is_ok();

        debug!(verified, "worker signature check");
        verified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_signature(signature: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(&X_SIGNATURE, HeaderValue::from_str(signature).unwrap());
        headers
    }

    #[test]
    fn test_valid_signature() {
        let verifier = SharedSecretVerifier::new(Some("secret".to_string()));
        let body = b"{\"job\":\"done\"}";
        let signature = SharedSecretVerifier::sign("secret", body);
        assert!(verifier.verify(&headers_with_signature(&signature), body));
    }

    #[test]
    fn test_wrong_secret() {
        let verifier = SharedSecretVerifier::new(Some("secret".to_string()));
        let body = b"payload";
        let signature = SharedSecretVerifier::sign("other-secret", body);
        assert!(!verifier.verify(&headers_with_signature(&signature), body));
    }

    #[test]
    fn test_tampered_body() {
        let verifier = SharedSecretVerifier::new(Some("secret".to_string()));
        let signature = SharedSecretVerifier::sign("secret", b"original");
        assert!(!verifier.verify(&headers_with_signature(&signature), b"tampered"));
    }

    #[test]
    fn test_missing_header() {
        let verifier = SharedSecretVerifier::new(Some("secret".to_string()));
        assert!(!verifier.verify(&HeaderMap::new(), b"payload"));
    }

    #[test]
    fn test_no_secret_configured() {
        let verifier = SharedSecretVerifier::new(None);
        let signature = SharedSecretVerifier::sign("anything", b"payload");
        assert!(!verifier.verify(&headers_with_signature(&signature), b"payload"));
    }

    #[test]
    fn test_malformed_hex() {
        let verifier = SharedSecretVerifier::new(Some("secret".to_string()));
        assert!(!verifier.verify(&headers_with_signature("not-hex!"), b"payload"));
    }
}
