//! Proof Key for Code Exchange (RFC 7636).
//!
//! The verifier is drawn from the unreserved character set
//! `A-Z a-z 0-9 - . _ ~`; the challenge is `BASE64URL(SHA256(verifier))`
//! without padding (the `S256` method).

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use ring::digest;
use serde::{Deserialize, Serialize};

/// Characters allowed in a code verifier.
const UNRESERVED: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// Length of generated verifiers.
pub const DEFAULT_VERIFIER_LEN: usize = 50;

/// Shortest verifier RFC 7636 allows.
pub const MIN_VERIFIER_LEN: usize = 43;

/// Longest verifier RFC 7636 allows.
pub const MAX_VERIFIER_LEN: usize = 128;

/// The only challenge method this crate sends.
pub const CHALLENGE_METHOD: &str = "S256";

/// A verifier together with its derived challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkcePair {
    /// Secret sent with the token request.
    pub verifier: String,
    /// Public value sent with the authorization request.
    pub challenge: String,
}

impl PkcePair {
    /// Generate a fresh verifier of [`DEFAULT_VERIFIER_LEN`] and derive its
    /// challenge.
    pub fn generate() -> Self {
        Self::from_verifier(generate_verifier())
    }

    /// Derive the challenge for an existing verifier.
    pub fn from_verifier(verifier: impl Into<String>) -> Self {
        let verifier = verifier.into();
        let challenge = derive_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}

/// Generate a verifier of [`DEFAULT_VERIFIER_LEN`] characters from the
/// thread-local random source.
pub fn generate_verifier() -> String {
    generate_verifier_with(&mut rand::thread_rng(), DEFAULT_VERIFIER_LEN)
}

/// Generate a verifier of `len` characters from `rng`.
///
/// `len` is clamped into `MIN_VERIFIER_LEN..=MAX_VERIFIER_LEN`.
pub fn generate_verifier_with<R: Rng>(rng: &mut R, len: usize) -> String {
    let len = len.clamp(MIN_VERIFIER_LEN, MAX_VERIFIER_LEN);
    (0..len)
        .map(|_| UNRESERVED[rng.gen_range(0..UNRESERVED.len())] as char)
        .collect()
}

/// Derive the `S256` code challenge for `verifier`.
pub fn derive_challenge(verifier: &str) -> String {
    let hash = digest::digest(&digest::SHA256, verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash.as_ref())
}

/// Check that `verifier` has a legal length and only unreserved characters.
pub fn is_valid_verifier(verifier: &str) -> bool {
    (MIN_VERIFIER_LEN..=MAX_VERIFIER_LEN).contains(&verifier.len())
        && verifier.bytes().all(|b| UNRESERVED.contains(&b))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
