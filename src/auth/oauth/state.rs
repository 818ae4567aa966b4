//! State parameter handling for OAuth CSRF protection.
//!
//! This module provides [`AuthorizationState`], the signed nonce issued at
//! the start of a login attempt, and [`AuthorizationGrant`], the `code` and
//! `state` pair the authorization server sends back.
//!
//! # Overview
//!
//! The nonce travels through the authorization server as the `state` query
//! parameter. Only its signature stays in the session. On the callback the
//! presented `state` is signed again and compared with the stored signature,
//! so a value the server never issued cannot validate.
//!
//! # Example
//!
//! ```rust
//! use oauth_relying_party::auth::oauth::hmac::StateSigner;
//! use oauth_relying_party::auth::oauth::token::RandomTokenSource;
//! use oauth_relying_party::auth::oauth::AuthorizationState;
//! use oauth_relying_party::SecretKey;
//!
//! let signer = StateSigner::new(SecretKey::new("state", "k").unwrap());
//! let state = AuthorizationState::generate(&RandomTokenSource::new(32), &signer);
//! assert!(signer.verify(state.nonce(), state.signature()));
//! ```

use serde::Deserialize;
use std::fmt;

use crate::auth::oauth::hmac::StateSigner;
use crate::auth::oauth::token::RandomTokenSource;

/// A signed state nonce for one login attempt.
///
/// Single-use: the session forgets the signature as soon as a callback
/// carrying a code is processed, whether or not it validated.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationState {
    nonce: String,
    signature: String,
}

// Verify AuthorizationState is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AuthorizationState>();
};

impl AuthorizationState {
    /// Generates a fresh URL-safe nonce and signs it.
    #[must_use]
    pub fn generate(source: &RandomTokenSource, signer: &StateSigner) -> Self {
        let nonce = source.url_safe();
        let signature = signer.sign(&nonce);
        Self { nonce, signature }
    }

    /// Rebuilds a state from its parts.
    #[must_use]
    pub fn from_parts(nonce: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            nonce: nonce.into(),
            signature: signature.into(),
        }
    }

    /// The value sent as the `state` query parameter.
    #[must_use]
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Hex HMAC-SHA256 of the nonce, kept in the session.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }
}

impl fmt::Debug for AuthorizationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationState")
            .field("nonce_len", &self.nonce.len())
            .field("signature", &"*****")
            .finish()
    }
}

/// Query parameters received on the callback endpoint.
///
/// Both fields are optional: a first visit carries neither, and only the
/// presence of `code` decides whether the callback completes a login.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CallbackQuery {
    /// The grant code, if the authorization server sent one.
    pub code: Option<String>,
    /// The echoed state nonce.
    pub state: Option<String>,
}

impl CallbackQuery {
    /// Converts to a grant when a code is present.
    ///
    /// A missing `state` becomes an empty string, which never verifies.
    #[must_use]
    pub fn into_grant(self) -> Option<AuthorizationGrant> {
        self.code.map(|code| AuthorizationGrant {
            code,
            state: self.state.unwrap_or_default(),
        })
    }
}

/// A grant code and its echoed state, used exactly once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationGrant {
    /// The short-lived authorization code.
    pub code: String,
    /// The state value presented alongside the code.
    pub state: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::oauth::hmac::sign;
    use crate::config::SecretKey;

    fn signer() -> StateSigner {
        StateSigner::new(SecretKey::new("state", "k").unwrap())
    }

    #[test]
    fn test_generate_signs_the_nonce() {
        let state = AuthorizationState::generate(&RandomTokenSource::new(16), &signer());
        assert_eq!(state.nonce().len(), 22);
        assert_eq!(state.signature(), sign(b"k", state.nonce()));
    }

    #[test]
    fn test_generate_produces_unique_nonces() {
        let source = RandomTokenSource::new(32);
        let a = AuthorizationState::generate(&source, &signer());
        let b = AuthorizationState::generate(&source, &signer());
        assert_ne!(a.nonce(), b.nonce());
        assert_ne!(a.signature(), b.signature());
    }

    #[test]
    fn test_nonce_is_url_safe() {
        let state = AuthorizationState::generate(&RandomTokenSource::new(88), &signer());
        assert!(state
            .nonce()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_debug_hides_signature() {
        let state = AuthorizationState::from_parts("nonce-value", "signature-value");
        let debug = format!("{state:?}");
        assert!(!debug.contains("signature-value"));
        assert!(!debug.contains("nonce-value"));
    }

    #[test]
    fn test_callback_query_without_code_is_not_a_grant() {
        let query = CallbackQuery {
            code: None,
            state: Some("abc".to_string()),
        };
        assert_eq!(query.into_grant(), None);
        assert_eq!(CallbackQuery::default().into_grant(), None);
    }

    #[test]
    fn test_callback_query_missing_state_becomes_empty() {
        let query = CallbackQuery {
            code: Some("code-1".to_string()),
            state: None,
        };
        assert_eq!(
            query.into_grant(),
            Some(AuthorizationGrant {
                code: "code-1".to_string(),
                state: String::new(),
            })
        );
    }
}
