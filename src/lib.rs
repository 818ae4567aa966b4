//! # OAuth Relying Party
//!
//! A minimal OAuth 2.0 authorization code client that logs a user in
//! against an authorization server and proxies one protected resource.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`AppConfig`] and [`AppConfigBuilder`]
//! - Validated newtypes for client credentials, secrets and URLs
//! - Cryptographically random tokens and HMAC-signed `state` values via [`auth::oauth`]
//! - The authorization code flow as an explicit state machine
//! - Per-user-agent sessions via [`auth::session`]
//! - Outbound calls to the token endpoint and protected resource via [`clients`]
//! - The HTTP surface (`/`, `/service`, `/service/callback`, `/error`) via [`server`]
//!
//! ## Quick Start
//!
//! ```rust
//! use oauth_relying_party::{AppConfig, BaseUrl, ClientId, ClientSecret};
//!
//! let config = AppConfig::builder()
//!     .client_id(ClientId::new("my-client").unwrap())
//!     .client_secret(ClientSecret::new("my-secret").unwrap())
//!     .service_url(BaseUrl::new("https://auth.example.com").unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.redirect_uri(), "http://localhost:5000/service/callback");
//! ```
//!
//! ## Running the Flow
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use oauth_relying_party::auth::oauth::{AuthorizationFlow, FlowOutcome};
//! use oauth_relying_party::auth::MemorySession;
//!
//! let flow = AuthorizationFlow::new(Arc::new(config))?;
//! let mut session = MemorySession::new();
//!
//! match flow.service(&mut session).await {
//!     FlowOutcome::Redirect(url) => { /* send the user agent to url */ }
//!     FlowOutcome::Payload(json) => { /* the protected resource */ }
//!     FlowOutcome::Failed(failure) => { /* show failure.reason */ }
//! }
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: Configuration is instance-based and passed explicitly
//! - **Fail-fast validation**: All newtypes validate on construction
//! - **Thread-safe**: Shared types are `Send + Sync`
//! - **Secrets stay server-side**: Only the state signature and access token
//!   are kept, and only in the session

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod server;

// Re-export public types at crate root for convenience
pub use config::{AppConfig, AppConfigBuilder, BaseUrl, ClientId, ClientSecret, SecretKey};
pub use error::ConfigError;

pub use auth::oauth::{AuthorizationFlow, Failure, FlowOutcome, OAuthError};
pub use clients::{HttpError, HttpResponseError};
