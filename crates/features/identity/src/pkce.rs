//! Proof Key for Code Exchange (RFC 7636), `S256` method only.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use lovebird_kernel::nanoid;
use sha2::{Digest, Sha256};

const VERIFIER_LEN: usize = 64;

/// A verifier and its derived challenge.
#[derive(Clone, PartialEq, Eq)]
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

impl Pkce {
    /// Fresh random verifier from the unreserved URL alphabet.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_verifier(nanoid!(VERIFIER_LEN))
    }

    #[must_use]
    pub fn from_verifier(verifier: impl Into<String>) -> Self {
        let verifier = verifier.into();
        let challenge = challenge(&verifier);
        Self { verifier, challenge }
    }
}

impl std::fmt::Debug for Pkce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pkce").field("challenge", &self.challenge).finish_non_exhaustive()
    }
}

/// `BASE64URL-NOPAD(SHA256(verifier))`.
#[must_use]
pub fn challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}
