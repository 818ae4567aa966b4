//! OAuth authorization URL generation.
//!
//! This module provides the [`begin_auth`] function for generating the
//! authorization redirect and the [`BeginAuthResult`] struct containing the
//! URL and the signed state.
//!
//! # Overview
//!
//! `begin_auth` is the first step of the authorization code flow. It
//! generates:
//! 1. A signed, high-entropy state nonce for CSRF protection
//! 2. An authorization URL to redirect the user agent to
//!
//! # Example
//!
//! ```rust
//! use oauth_relying_party::{AppConfig, ClientId, ClientSecret};
//! use oauth_relying_party::auth::oauth::begin_auth;
//! use oauth_relying_party::auth::oauth::hmac::StateSigner;
//! use oauth_relying_party::auth::oauth::token::RandomTokenSource;
//!
//! let config = AppConfig::builder()
//!     .client_id(ClientId::new("my-client").unwrap())
//!     .client_secret(ClientSecret::new("my-secret").unwrap())
//!     .build()
//!     .unwrap();
//! let signer = StateSigner::new(config.state_secret().clone());
//! let source = RandomTokenSource::new(config.state_entropy());
//!
//! let result = begin_auth(&config, &source, &signer);
//! assert!(result.auth_url.starts_with("http://localhost:6000/login/oauth/authorization?"));
//! // Store result.state.signature() in the session
//! // Redirect the user agent to result.auth_url
//! ```

use crate::auth::oauth::hmac::StateSigner;
use crate::auth::oauth::state::AuthorizationState;
use crate::auth::oauth::token::RandomTokenSource;
use crate::config::AppConfig;

/// Result of [`begin_auth`].
#[derive(Clone, Debug)]
pub struct BeginAuthResult {
    /// Complete authorization URL, query string included.
    pub auth_url: String,

    /// The issued state. Only its signature belongs in the session.
    pub state: AuthorizationState,
}

/// Generates a signed state and the authorization URL carrying it.
///
/// The query carries `client_id`, `redirect_uri`, `response_type=code`,
/// `scope` and `state`, each percent-encoded. The `redirect_uri` is the same
/// value later sent to the token endpoint.
#[must_use]
pub fn begin_auth(
    config: &AppConfig,
    source: &RandomTokenSource,
    signer: &StateSigner,
) -> BeginAuthResult {
    let state = AuthorizationState::generate(source, signer);
    let redirect_uri = config.redirect_uri();

    let params = [
        ("client_id", config.client_id().as_ref()),
        ("redirect_uri", redirect_uri.as_str()),
        ("response_type", "code"),
        ("scope", config.scope()),
        ("state", state.nonce()),
    ];

    let query_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let auth_url = format!("{}?{}", config.authorization_endpoint(), query_string);

    BeginAuthResult { auth_url, state }
}

// Verify BeginAuthResult is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<BeginAuthResult>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BaseUrl, ClientId, ClientSecret, SecretKey};

    fn create_test_config() -> AppConfig {
        AppConfig::builder()
            .client_id(ClientId::new("test-client").unwrap())
            .client_secret(ClientSecret::new("test-secret").unwrap())
            .state_secret(SecretKey::new("state", "k").unwrap())
            .service_url(BaseUrl::new("http://auth.example.com").unwrap())
            .base_url(BaseUrl::new("https://app.example.com").unwrap())
            .scope("read write")
            .state_entropy(16)
            .build()
            .unwrap()
    }

    fn run(config: &AppConfig) -> BeginAuthResult {
        let signer = StateSigner::new(config.state_secret().clone());
        let source = RandomTokenSource::new(config.state_entropy());
        begin_auth(config, &source, &signer)
    }

    #[test]
    fn test_begin_auth_generates_correct_url_structure() {
        let result = run(&create_test_config());
        assert!(result
            .auth_url
            .starts_with("http://auth.example.com/login/oauth/authorization?client_id=test-client&"));
    }

    #[test]
    fn test_begin_auth_includes_all_required_params() {
        let result = run(&create_test_config());
        assert!(result.auth_url.contains("client_id=test-client"));
        assert!(result.auth_url.contains("response_type=code"));
        assert!(result.auth_url.contains("scope=read%20write"));
        assert!(result.auth_url.contains("state="));
    }

    #[test]
    fn test_begin_auth_redirect_uri_format() {
        let result = run(&create_test_config());
        let expected = urlencoding::encode("https://app.example.com/service/callback");
        assert!(result
            .auth_url
            .contains(&format!("redirect_uri={expected}")));
    }

    #[test]
    fn test_begin_auth_state_in_url_matches_returned_state() {
        let result = run(&create_test_config());
        assert!(result.auth_url.ends_with(&format!(
            "&state={}",
            urlencoding::encode(result.state.nonce())
        )));
    }

    #[test]
    fn test_begin_auth_state_is_signed_and_sized() {
        let config = create_test_config();
        let result = run(&config);
        // 16 bytes -> 22 unpadded base64 characters
        assert_eq!(result.state.nonce().len(), 22);
        let signer = StateSigner::new(config.state_secret().clone());
        assert!(signer.verify(result.state.nonce(), result.state.signature()));
    }

    #[test]
    fn test_begin_auth_unique_states() {
        let config = create_test_config();
        let first = run(&config);
        let second = run(&config);
        assert_ne!(first.state.nonce(), second.state.nonce());
        assert_ne!(first.auth_url, second.auth_url);
    }
}
