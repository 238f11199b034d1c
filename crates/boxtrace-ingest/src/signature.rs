//! Inbound webhook signature verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded SHA-256 digest length.
const SIGNATURE_HEX_LEN: usize = 64;

/// Verifies HMAC-SHA256 signatures over raw request bodies.
///
/// The signature covers the exact byte sequence of the body as received;
/// comparison happens in constant time. Neither the secret nor the
/// supplied token is ever logged.
pub struct SignatureGate {
    secret: String,
}

impl SignatureGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Build the gate from `WEBHOOK_SECRET`.
    ///
    /// Returns None when the secret is unset or empty; the caller must then
    /// refuse webhook traffic rather than accept it unauthenticated.
    pub fn from_env() -> Option<Self> {
        std::env::var("WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .map(Self::new)
    }

    /// Decide authenticity of a body given the caller-supplied token.
    pub fn verify(&self, body: &[u8], token: Option<&str>) -> bool {
        let Some(token) = token else {
            warn!(
                subsystem = "ingest",
                component = "signature_gate",
                signature_present = false,
                "No signature provided in request"
            );
            return false;
        };

        // Format check before any HMAC work: a token that is not a
        // 64-char hex string can never match.
        let Some(expected) = decode_token(token) else {
            warn!(
                subsystem = "ingest",
                component = "signature_gate",
                signature_length = token.len(),
                "Invalid signature format"
            );
            return false;
        };

        let Ok(mut mac) = HmacSha256::new_from_slice(self.secret.as_bytes()) else {
            return false;
        };
        mac.update(body);

        // verify_slice is constant-time.
        let valid = mac.verify_slice(&expected).is_ok();
        if !valid {
            warn!(
                subsystem = "ingest",
                component = "signature_gate",
                signature_present = true,
                "Signature mismatch"
            );
        }
        valid
    }

    /// Compute the hex signature for a body.
    ///
    /// Used by tests and operator tooling; production traffic is verified,
    /// not signed.
    pub fn sign(&self, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }
}

/// Decode a well-formed signature token: exactly 64 hexadecimal characters.
fn decode_token(token: &str) -> Option<Vec<u8>> {
    if token.len() != SIGNATURE_HEX_LEN {
        return None;
    }
    hex::decode(token).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_roundtrip() {
        let gate = SignatureGate::new("test-secret");
        let body = br#"{"data": {"type": "notification"}}"#;
        let signature = gate.sign(body);
        assert!(gate.verify(body, Some(&signature)));
    }

    #[test]
    fn test_verify_rejects_missing_token() {
        let gate = SignatureGate::new("test-secret");
        assert!(!gate.verify(b"body", None));
    }

    #[test]
    fn test_verify_rejects_non_hex_token() {
        let gate = SignatureGate::new("test-secret");
        assert!(!gate.verify(b"body", Some("not-hex")));
        // 64 chars but not hex
        let bad = "zz".repeat(32);
        assert!(!gate.verify(b"body", Some(&bad)));
    }

    #[test]
    fn test_verify_rejects_wrong_length_hex() {
        let gate = SignatureGate::new("test-secret");
        assert!(!gate.verify(b"body", Some("abcd")));
        let too_long = "ab".repeat(40);
        assert!(!gate.verify(b"body", Some(&too_long)));
    }

    #[test]
    fn test_verify_rejects_mutated_body() {
        let gate = SignatureGate::new("test-secret");
        let signature = gate.sign(b"original body");
        assert!(!gate.verify(b"original bodY", Some(&signature)));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let signer = SignatureGate::new("secret-a");
        let verifier = SignatureGate::new("secret-b");
        let body = b"payload";
        let signature = signer.sign(body);
        assert!(!verifier.verify(body, Some(&signature)));
    }

    #[test]
    fn test_sign_is_deterministic_hex() {
        let gate = SignatureGate::new("test-secret");
        let a = gate.sign(b"payload");
        let b = gate.sign(b"payload");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
