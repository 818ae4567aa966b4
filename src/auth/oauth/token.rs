//! Cryptographically secure random tokens.
//!
//! This module provides [`token_bytes`], [`token_hex`] and [`token_url`] for
//! generating unguessable values such as state nonces and session ids, plus
//! the [`RandomTokenSource`] that carries a default entropy.
//!
//! # Security
//!
//! Bytes always come from the operating system's entropy source via
//! [`OsRng`]. A seeded or userspace generator is never used. If the system
//! source is unavailable the process cannot produce safe tokens and panics.
//!
//! # Example
//!
//! ```rust
//! use oauth_relying_party::auth::oauth::token::{token_hex, token_url};
//!
//! assert_eq!(token_hex(16).len(), 32);
//! assert!(!token_url(16).contains('='));
//! ```

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;

/// Entropy used when the caller does not ask for a specific size.
pub const DEFAULT_ENTROPY: usize = 32;

/// Returns `entropy` bytes read from the operating system's entropy source.
///
/// # Panics
///
/// Panics if the operating system cannot supply random bytes. There is no
/// safe way to continue without them.
#[must_use]
pub fn token_bytes(entropy: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; entropy];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Returns a lowercase hex token of length `2 * entropy`.
#[must_use]
pub fn token_hex(entropy: usize) -> String {
    hex::encode(token_bytes(entropy))
}

/// Returns a URL-safe base64 token without `=` padding.
#[must_use]
pub fn token_url(entropy: usize) -> String {
    URL_SAFE_NO_PAD.encode(token_bytes(entropy))
}

/// A source of random tokens with a fixed entropy.
///
/// # Example
///
/// ```rust
/// use oauth_relying_party::auth::oauth::token::RandomTokenSource;
///
/// let source = RandomTokenSource::new(88);
/// assert_eq!(source.hex().len(), 176);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomTokenSource {
    entropy: usize,
}

impl RandomTokenSource {
    /// Creates a source producing `entropy` random bytes per token.
    #[must_use]
    pub const fn new(entropy: usize) -> Self {
        Self { entropy }
    }

    /// Returns the configured entropy in bytes.
    #[must_use]
    pub const fn entropy(&self) -> usize {
        self.entropy
    }

    /// Generates raw random bytes.
    #[must_use]
    pub fn generate(&self) -> Vec<u8> {
        token_bytes(self.entropy)
    }

    /// Generates a lowercase hex token.
    #[must_use]
    pub fn hex(&self) -> String {
        token_hex(self.entropy)
    }

    /// Generates an unpadded URL-safe base64 token.
    #[must_use]
    pub fn url_safe(&self) -> String {
        token_url(self.entropy)
    }
}

impl Default for RandomTokenSource {
    fn default() -> Self {
        Self::new(DEFAULT_ENTROPY)
    }
}

// Internal hex encoding since we don't want to add another dependency
pub(crate) mod hex {
    const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";

    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        let bytes = bytes.as_ref();
        let mut result = String::with_capacity(bytes.len() * 2);
        for &byte in bytes {
            result.push(HEX_CHARS[(byte >> 4) as usize] as char);
            result.push(HEX_CHARS[(byte & 0x0f) as usize] as char);
        }
        result
    }
}
