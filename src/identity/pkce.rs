//! PKCE verifier/challenge pair (RFC 7636)
//!
//! The S256 challenge is sent with the authorization request; the raw
//! verifier is only revealed at code-exchange time, so an intercepted
//! authorization code is useless without it.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Entropy for the code verifier (32 bytes -> 43 base64url chars)
const VERIFIER_BYTES: usize = 32;

/// A PKCE code verifier and its S256 challenge.
#[derive(Debug, Clone)]
pub struct PkcePair {
    verifier: String,
    challenge: String,
}

impl PkcePair {
    /// Generate a fresh pair from OS randomness.
    pub fn generate() -> Self {
        let mut bytes = [0u8; VERIFIER_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let verifier = URL_SAFE_NO_PAD.encode(bytes);
        let challenge = Self::challenge_for(&verifier);
        Self { verifier, challenge }
    }

    /// Build a pair from a known verifier (used in tests).
    #[cfg(test)]
    pub(crate) fn from_verifier(verifier: &str) -> Self {
        Self {
            verifier: verifier.to_string(),
            challenge: Self::challenge_for(verifier),
        }
    }

    fn challenge_for(verifier: &str) -> String {
        let digest = Sha256::digest(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }

    /// The raw verifier, sent only at code-exchange time.
    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    /// The S256 challenge, sent with the authorization request.
    pub fn challenge(&self) -> &str {
        &self.challenge
    }

    /// Challenge method identifier for the authorization request.
    pub fn method(&self) -> &'static str {
        "S256"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc7636_test_vector() {
        // Appendix B of RFC 7636
        let pair = PkcePair::from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
        assert_eq!(pair.challenge(), "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
        assert_eq!(pair.method(), "S256");
    }

    #[test]
    fn test_generated_verifier_shape() {
        let pair = PkcePair::generate();
        // 32 bytes base64url-no-pad -> 43 characters, unreserved alphabet
        assert_eq!(pair.verifier().len(), 43);
        assert!(pair
            .verifier()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(pair.challenge().len(), 43);
        assert_ne!(pair.verifier(), pair.challenge());
    }

    #[test]
    fn test_pairs_are_independent() {
        let a = PkcePair::generate();
        let b = PkcePair::generate();
        assert_ne!(a.verifier(), b.verifier());
    }
}
