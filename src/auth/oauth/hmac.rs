//! HMAC-SHA256 signing of state nonces and session ids.
//!
//! This module binds an opaque value to a server-held secret so a client
//! that observes, or even chooses, the value cannot produce a matching
//! signature without knowing the secret.
//!
//! # Security
//!
//! All signature comparisons use constant-time comparison to prevent timing
//! attacks. A mismatch in length is reported as a mismatch, never as an
//! early return that depends on content.
//!
//! # Example
//!
//! ```rust
//! use oauth_relying_party::auth::oauth::hmac::{sign, verify};
//!
//! let signature = sign(b"server-secret", "nonce-value");
//! assert_eq!(signature.len(), 64);
//! assert!(verify(b"server-secret", "nonce-value", &signature));
//! assert!(!verify(b"server-secret", "forged-nonce", &signature));
//! ```

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::auth::oauth::token::hex;
use crate::config::SecretKey;

type HmacSha256 = Hmac<Sha256>;

/// Computes `hex(HMAC-SHA256(secret, message))`.
///
/// # Note
///
/// This function uses `expect()` internally but this will never panic because
/// HMAC-SHA256 accepts keys of any length.
///
/// # Example
///
/// ```rust
/// use oauth_relying_party::auth::oauth::hmac::sign;
///
/// let sig = sign(b"k", "abc123");
/// assert_eq!(sig.len(), 64); // SHA256 produces 32 bytes = 64 hex chars
/// ```
#[must_use]
#[allow(clippy::missing_panics_doc)] // HMAC accepts any key size, so this never panics
pub fn sign(secret: &[u8], message: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Recomputes the signature of `presented` and compares it to `stored`.
///
/// Returns `false` on any mismatch, including a length mismatch.
#[must_use]
pub fn verify(secret: &[u8], presented: &str, stored: &str) -> bool {
    constant_time_compare(&sign(secret, presented), stored)
}

/// Performs constant-time comparison of two strings.
///
/// # Returns
///
/// `true` if the strings are equal, `false` otherwise.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    // ConstantTimeEq handles different lengths securely
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Signs and verifies values with one server-held key.
///
/// # Example
///
/// ```rust
/// use oauth_relying_party::auth::oauth::hmac::StateSigner;
/// use oauth_relying_party::SecretKey;
///
/// let signer = StateSigner::new(SecretKey::new("state", "k").unwrap());
/// let signature = signer.sign("abc123");
/// assert!(signer.verify("abc123", &signature));
/// ```
#[derive(Clone, Debug)]
pub struct StateSigner {
    key: SecretKey,
}

impl StateSigner {
    /// Creates a signer using `key`.
    #[must_use]
    pub const fn new(key: SecretKey) -> Self {
        Self { key }
    }

    /// Returns the hex signature of `nonce`.
    #[must_use]
    pub fn sign(&self, nonce: &str) -> String {
        sign(self.key.as_ref(), nonce)
    }

    /// Checks a presented nonce against a previously stored signature.
    #[must_use]
    pub fn verify(&self, presented: &str, stored_signature: &str) -> bool {
        verify(self.key.as_ref(), presented, stored_signature)
    }
}

// Verify StateSigner is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StateSigner>();
};
