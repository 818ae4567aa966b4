//! Configuration types for the relying party.
//!
//! This module provides the immutable [`AppConfig`] loaded once at startup
//! and handed to the flow and the HTTP layer behind an `Arc`.
//!
//! # Overview
//!
//! - [`AppConfig`]: All settings for one process
//! - [`AppConfigBuilder`]: Builder with development defaults
//! - [`ClientId`], [`ClientSecret`]: Credentials issued by the authorization server
//! - [`SecretKey`]: HMAC key material with masked debug output
//! - [`BaseUrl`]: A validated absolute URL
//!
//! # Example
//!
//! ```rust
//! use oauth_relying_party::{AppConfig, ClientId, ClientSecret};
//!
//! let config = AppConfig::builder()
//!     .client_id(ClientId::new("my-client").unwrap())
//!     .client_secret(ClientSecret::new("my-secret").unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.state_entropy(), 88);
//! assert_eq!(config.redirect_uri(), "http://localhost:5000/service/callback");
//! ```

mod newtypes;

pub use newtypes::{BaseUrl, ClientId, ClientSecret, SecretKey};

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::time::Duration;

/// Path of the protected resource proxy.
pub const SERVICE_PATH: &str = "/service";

/// Path of the combined begin/complete authorization endpoint.
pub const CALLBACK_PATH: &str = "/service/callback";

/// Path of the failure page.
pub const ERROR_PATH: &str = "/error";

/// Default authorization/resource server.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:6000";

/// Default public URL of this application.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Default scope requested during authorization.
pub const DEFAULT_SCOPE: &str = "giveit2me";

/// Default entropy of the state nonce in bytes.
pub const DEFAULT_STATE_ENTROPY: usize = 88;

/// Smallest accepted state nonce entropy in bytes.
pub const MIN_STATE_ENTROPY: usize = 16;

/// Largest accepted state nonce entropy in bytes.
pub const MAX_STATE_ENTROPY: usize = 1024;

/// Default timeout for outbound requests.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_CLIENT_ID: &str = "dev-client";
const DEFAULT_CLIENT_SECRET: &str = "dev-secret";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

/// Immutable configuration for the relying party.
///
/// Built once via [`AppConfig::builder`] or [`AppConfig::from_env`].
#[derive(Clone, Debug)]
pub struct AppConfig {
    client_id: ClientId,
    client_secret: ClientSecret,
    session_secret: SecretKey,
    state_secret: SecretKey,
    state_entropy: usize,
    service_url: BaseUrl,
    base_url: BaseUrl,
    scope: String,
    http_timeout: Duration,
    bind_addr: SocketAddr,
}

impl AppConfig {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::new()
    }

    /// Loads configuration from `APP_*` environment variables.
    ///
    /// Every variable is optional; the defaults are only suitable for local
    /// development.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        match lookup("APP_CLIENT_ID") {
            Some(id) => builder = builder.client_id(ClientId::new(id)?),
            None => {
                tracing::warn!("APP_CLIENT_ID is not set, using the development client id");
                builder = builder.client_id(ClientId::new(DEFAULT_CLIENT_ID)?);
            }
        }

        match lookup("APP_CLIENT_SECRET") {
            Some(secret) => builder = builder.client_secret(ClientSecret::new(secret)?),
            None => {
                tracing::warn!("APP_CLIENT_SECRET is not set, using the development client secret");
                builder = builder.client_secret(ClientSecret::new(DEFAULT_CLIENT_SECRET)?);
            }
        }

        if let Some(key) = lookup("APP_SECRET_KEY") {
            builder = builder.session_secret(SecretKey::new("APP_SECRET_KEY", key)?);
        }
        if let Some(key) = lookup("APP_STATE_SECRET") {
            builder = builder.state_secret(SecretKey::new("APP_STATE_SECRET", key)?);
        }
        if let Some(raw) = lookup("APP_STATE_ENTROPY") {
            builder = builder.state_entropy(parse_var("APP_STATE_ENTROPY", &raw)?);
        }
        if let Some(url) = lookup("APP_SERVICE_URL") {
            builder = builder.service_url(BaseUrl::new(url)?);
        }
        if let Some(url) = lookup("APP_BASE_URL") {
            builder = builder.base_url(BaseUrl::new(url)?);
        }
        if let Some(scope) = lookup("APP_SCOPE") {
            builder = builder.scope(scope);
        }
        if let Some(raw) = lookup("APP_HTTP_TIMEOUT_SECS") {
            let secs: u64 = parse_var("APP_HTTP_TIMEOUT_SECS", &raw)?;
            builder = builder.http_timeout(Duration::from_secs(secs));
        }
        if let Some(raw) = lookup("APP_BIND_ADDR") {
            builder = builder.bind_addr(parse_var("APP_BIND_ADDR", &raw)?);
        }

        builder.build()
    }

    /// Returns the client id.
    #[must_use]
    pub const fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Returns the client secret.
    #[must_use]
    pub const fn client_secret(&self) -> &ClientSecret {
        &self.client_secret
    }

    /// Returns the key that signs session cookies.
    #[must_use]
    pub const fn session_secret(&self) -> &SecretKey {
        &self.session_secret
    }

    /// Returns the key that signs state nonces.
    #[must_use]
    pub const fn state_secret(&self) -> &SecretKey {
        &self.state_secret
    }

    /// Returns the nonce entropy in bytes.
    #[must_use]
    pub const fn state_entropy(&self) -> usize {
        self.state_entropy
    }

    /// Returns the authorization/resource server base URL.
    #[must_use]
    pub const fn service_url(&self) -> &BaseUrl {
        &self.service_url
    }

    /// Returns the public base URL of this application.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the requested scope.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Returns the outbound request timeout.
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        self.http_timeout
    }

    /// Returns the listen address of the HTTP server.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// The redirect URI registered with the authorization server.
    ///
    /// Sent unchanged in the authorization redirect and the token exchange.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        self.base_url.join(CALLBACK_PATH)
    }

    /// `GET` endpoint the user agent is sent to for authorization.
    #[must_use]
    pub fn authorization_endpoint(&self) -> String {
        self.service_url.join("/login/oauth/authorization")
    }

    /// `POST` endpoint that exchanges a grant code for an access token.
    #[must_use]
    pub fn token_endpoint(&self) -> String {
        self.service_url.join("/login/oauth/access_token")
    }

    /// `GET` endpoint of the protected resource.
    #[must_use]
    pub fn resource_endpoint(&self) -> String {
        self.service_url.join("/user")
    }
}

fn parse_var<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar {
            var,
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

// Verify AppConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AppConfig>();
};

/// Builder for [`AppConfig`].
///
/// `client_id` and `client_secret` are required. Secrets left unset are
/// generated randomly per process.
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    client_id: Option<ClientId>,
    client_secret: Option<ClientSecret>,
    session_secret: Option<SecretKey>,
    state_secret: Option<SecretKey>,
    state_entropy: Option<usize>,
    service_url: Option<BaseUrl>,
    base_url: Option<BaseUrl>,
    scope: Option<String>,
    http_timeout: Option<Duration>,
    bind_addr: Option<SocketAddr>,
}

impl AppConfigBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the client id (required).
    #[must_use]
    pub fn client_id(mut self, id: ClientId) -> Self {
        self.client_id = Some(id);
        self
    }

    /// Sets the client secret (required).
    #[must_use]
    pub fn client_secret(mut self, secret: ClientSecret) -> Self {
        self.client_secret = Some(secret);
        self
    }

    /// Sets the session cookie signing key.
    #[must_use]
    pub fn session_secret(mut self, key: SecretKey) -> Self {
        self.session_secret = Some(key);
        self
    }

    /// Sets the state signing key.
    #[must_use]
    pub fn state_secret(mut self, key: SecretKey) -> Self {
        self.state_secret = Some(key);
        self
    }

    /// Sets the state nonce entropy in bytes.
    #[must_use]
    pub const fn state_entropy(mut self, bytes: usize) -> Self {
        self.state_entropy = Some(bytes);
        self
    }

    /// Sets the authorization/resource server base URL.
    #[must_use]
    pub fn service_url(mut self, url: BaseUrl) -> Self {
        self.service_url = Some(url);
        self
    }

    /// Sets the public base URL of this application.
    #[must_use]
    pub fn base_url(mut self, url: BaseUrl) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the requested scope.
    #[must_use]
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Sets the outbound request timeout.
    #[must_use]
    pub const fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    /// Sets the listen address.
    #[must_use]
    pub const fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = Some(addr);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if credentials are
    /// missing and [`ConfigError::InvalidEntropy`] if the entropy is out of
    /// range.
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let client_id = self
            .client_id
            .ok_or(ConfigError::MissingRequiredField { field: "client_id" })?;
        let client_secret = self
            .client_secret
            .ok_or(ConfigError::MissingRequiredField {
                field: "client_secret",
            })?;

        let state_entropy = self.state_entropy.unwrap_or(DEFAULT_STATE_ENTROPY);
        if !(MIN_STATE_ENTROPY..=MAX_STATE_ENTROPY).contains(&state_entropy) {
            return Err(ConfigError::InvalidEntropy {
                bytes: state_entropy,
                min: MIN_STATE_ENTROPY,
                max: MAX_STATE_ENTROPY,
            });
        }

        let service_url = match self.service_url {
            Some(url) => url,
            None => BaseUrl::new(DEFAULT_SERVICE_URL)?,
        };
        let base_url = match self.base_url {
            Some(url) => url,
            None => BaseUrl::new(DEFAULT_BASE_URL)?,
        };
        let bind_addr = match self.bind_addr {
            Some(addr) => addr,
            None => parse_var("APP_BIND_ADDR", DEFAULT_BIND_ADDR)?,
        };

        Ok(AppConfig {
            client_id,
            client_secret,
            session_secret: self.session_secret.unwrap_or_else(SecretKey::random),
            state_secret: self.state_secret.unwrap_or_else(SecretKey::random),
            state_entropy,
            service_url,
            base_url,
            scope: self.scope.unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            http_timeout: self.http_timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT),
            bind_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_builder_requires_client_id() {
        let result = AppConfigBuilder::new()
            .client_secret(ClientSecret::new("secret").unwrap())
            .build();

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredField { field: "client_id" })
        ));
    }

    #[test]
    fn test_builder_requires_client_secret() {
        let result = AppConfigBuilder::new()
            .client_id(ClientId::new("id").unwrap())
            .build();

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredField {
                field: "client_secret"
            })
        ));
    }

    #[test]
    fn test_builder_provides_sensible_defaults() {
        let config = AppConfig::builder()
            .client_id(ClientId::new("id").unwrap())
            .client_secret(ClientSecret::new("secret").unwrap())
            .build()
            .unwrap();

        assert_eq!(config.state_entropy(), DEFAULT_STATE_ENTROPY);
        assert_eq!(config.scope(), "giveit2me");
        assert_eq!(config.http_timeout(), Duration::from_secs(10));
        assert_eq!(config.bind_addr().port(), 5000);
        assert_eq!(
            config.authorization_endpoint(),
            "http://localhost:6000/login/oauth/authorization"
        );
        assert_eq!(
            config.token_endpoint(),
            "http://localhost:6000/login/oauth/access_token"
        );
        assert_eq!(config.resource_endpoint(), "http://localhost:6000/user");
        assert_eq!(
            config.redirect_uri(),
            "http://localhost:5000/service/callback"
        );
        assert_ne!(config.session_secret(), config.state_secret());
    }

    #[test]
    fn test_builder_rejects_out_of_range_entropy() {
        let result = AppConfig::builder()
            .client_id(ClientId::new("id").unwrap())
            .client_secret(ClientSecret::new("secret").unwrap())
            .state_entropy(8)
            .build();

        assert!(matches!(
            result,
            Err(ConfigError::InvalidEntropy { bytes: 8, .. })
        ));
    }

    #[test]
    fn test_from_lookup_reads_all_variables() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("APP_CLIENT_ID", "client"),
            ("APP_CLIENT_SECRET", "shh"),
            ("APP_SECRET_KEY", "session-key"),
            ("APP_STATE_SECRET", "state-key"),
            ("APP_STATE_ENTROPY", "32"),
            ("APP_SERVICE_URL", "https://auth.example.com/"),
            ("APP_BASE_URL", "https://app.example.com"),
            ("APP_SCOPE", "read"),
            ("APP_HTTP_TIMEOUT_SECS", "3"),
            ("APP_BIND_ADDR", "0.0.0.0:8080"),
        ]))
        .unwrap();

        assert_eq!(config.client_id().as_ref(), "client");
        assert_eq!(config.client_secret().as_ref(), "shh");
        assert_eq!(config.session_secret().as_ref(), b"session-key");
        assert_eq!(config.state_secret().as_ref(), b"state-key");
        assert_eq!(config.state_entropy(), 32);
        assert_eq!(config.token_endpoint(), "https://auth.example.com/login/oauth/access_token");
        assert_eq!(config.redirect_uri(), "https://app.example.com/service/callback");
        assert_eq!(config.scope(), "read");
        assert_eq!(config.http_timeout(), Duration::from_secs(3));
        assert_eq!(config.bind_addr().port(), 8080);
    }

    #[test]
    fn test_from_lookup_uses_development_defaults() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.client_id().as_ref(), "dev-client");
        assert_eq!(config.client_secret().as_ref(), "dev-secret");
        assert_eq!(config.service_url().as_ref(), DEFAULT_SERVICE_URL);
    }

    #[test]
    fn test_from_lookup_rejects_bad_numbers() {
        let result = AppConfig::from_lookup(lookup_from(&[("APP_STATE_ENTROPY", "lots")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnvVar {
                var: "APP_STATE_ENTROPY",
                ..
            })
        ));
    }

    #[test]
    fn test_from_lookup_rejects_empty_explicit_secret() {
        let result = AppConfig::from_lookup(lookup_from(&[("APP_SECRET_KEY", "")]));
        assert_eq!(
            result.unwrap_err(),
            ConfigError::EmptySecret {
                name: "APP_SECRET_KEY"
            }
        );
    }

    #[test]
    fn test_config_debug_hides_secrets() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("APP_CLIENT_SECRET", "very-private"),
            ("APP_SECRET_KEY", "also-private"),
        ]))
        .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("very-private"));
        assert!(!debug.contains("also-private"));
    }

    #[test]
    fn test_config_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AppConfig>();
    }
}
