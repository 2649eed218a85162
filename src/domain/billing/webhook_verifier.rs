//! Gateway webhook signature verification.
//!
//! The gateway signs the raw request body with HMAC-SHA256 keyed by the
//! webhook secret and sends the lowercase hex digest in a header.
//!
//! # Fail-open
//!
//! With no secret configured every delivery is accepted unverified. This
//! exists for local development only and is logged on construction and on
//! each delivery. Production deployments must configure a secret.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Verifier for gateway webhook signatures.
#[derive(Clone)]
pub struct WebhookSignatureVerifier {
    secret: Option<SecretString>,
}

impl WebhookSignatureVerifier {
    /// Creates a verifier. An empty secret is treated as none.
    pub fn new(secret: Option<SecretString>) -> Self {
        let secret = secret.filter(|s| !s.expose_secret().is_empty());
        if secret.is_none() {
            tracing::warn!(
                "webhook secret not configured: signatures will NOT be verified (deployment risk)"
            );
        }
        Self { secret }
    }

    /// True when a secret is configured and signatures are checked.
    pub fn is_enforcing(&self) -> bool {
        self.secret.is_some()
    }

    /// Checks `signature` (hex) against the HMAC of `payload`.
    ///
    /// Comparison is constant-time over the decoded digest.
    pub fn verify(&self, payload: &[u8], signature: &str) -> bool {
        let Some(secret) = &self.secret else {
            tracing::warn!("accepting webhook without signature verification");
            return true;
        };

        let provided = match hex::decode(signature.trim()) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };

        let expected = compute_signature(secret.expose_secret().as_bytes(), payload);
        constant_time_compare(&expected, &provided)
    }
}

impl std::fmt::Debug for WebhookSignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSignatureVerifier")
            .field("enforcing", &self.is_enforcing())
            .finish()
    }
}

fn compute_signature(secret: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.is_empty() || a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Hex signature for a payload, as the gateway would send it.
#[cfg(test)]
pub fn sign_for_test(secret: &str, payload: &[u8]) -> String {
    hex::encode(compute_signature(secret.as_bytes(), payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    fn verifier() -> WebhookSignatureVerifier {
        WebhookSignatureVerifier::new(Some(SecretString::new(SECRET.to_string())))
    }

    #[test]
    fn valid_signature_verifies() {
        let payload = br#"{"event":"payment.authorized"}"#;
        let signature = sign_for_test(SECRET, payload);

        assert!(verifier().verify(payload, &signature));
    }

    #[test]
    fn uppercase_hex_is_accepted() {
        let payload = b"{}";
        let signature = sign_for_test(SECRET, payload).to_uppercase();

        assert!(verifier().verify(payload, &signature));
    }

    #[test]
    fn tampered_payload_fails() {
        let signature = sign_for_test(SECRET, br#"{"amount":100}"#);

        assert!(!verifier().verify(br#"{"amount":999}"#, &signature));
    }

    #[test]
    fn wrong_secret_fails() {
        let payload = b"{}";
        let signature = sign_for_test("other_secret", payload);

        assert!(!verifier().verify(payload, &signature));
    }

    #[test]
    fn corrupted_signature_fails() {
        let payload = b"{}";
        let mut signature = sign_for_test(SECRET, payload);
        let last = if signature.ends_with('0') { "1" } else { "0" };
        signature.replace_range(signature.len() - 1.., last);

        assert!(!verifier().verify(payload, &signature));
    }

    #[test]
    fn non_hex_and_truncated_signatures_fail() {
        let payload = b"{}";
        let signature = sign_for_test(SECRET, payload);

        assert!(!verifier().verify(payload, "not-hex"));
        assert!(!verifier().verify(payload, &signature[..32]));
        assert!(!verifier().verify(payload, ""));
    }

    #[test]
    fn missing_secret_fails_open() {
        let verifier = WebhookSignatureVerifier::new(None);

        assert!(!verifier.is_enforcing());
        assert!(verifier.verify(b"anything", "garbage"));
    }

    #[test]
    fn empty_secret_counts_as_missing() {
        let verifier = WebhookSignatureVerifier::new(Some(SecretString::new(String::new())));
        assert!(!verifier.is_enforcing());
    }

    #[test]
    fn debug_does_not_print_secret() {
        let output = format!("{:?}", verifier());
        assert!(!output.contains(SECRET));
    }
}
