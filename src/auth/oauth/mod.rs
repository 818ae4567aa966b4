//! OAuth 2.0 authorization code flow for a confidential client.
//!
//! This module implements the relying-party side of the flow: issuing a
//! signed `state`, redirecting to the authorization server, verifying the
//! callback and exchanging the grant for an access token.
//!
//! # Overview
//!
//! - [`begin_auth`]: Builds the authorization URL and a fresh signed state
//! - [`transition`]: The pure state machine deciding each next step
//! - [`AuthorizationFlow`]: Runs the state machine against a session
//! - [`exchange_code`]: Back-channel exchange of a grant for a token
//! - [`OAuthError`]: Flow errors and their [`Failure`] presentation
//!
//! # CSRF protection
//!
//! The `state` parameter is a random nonce. Only its HMAC-SHA256 signature
//! is stored in the session; the nonce itself travels through the user
//! agent. A callback is accepted only when the presented nonce verifies
//! against the stored signature, compared in constant time, and the stored
//! signature is removed before the exchange so it cannot be replayed.
//!
//! ```rust
//! use oauth_relying_party::auth::oauth::{hmac::StateSigner, token::RandomTokenSource};
//! use oauth_relying_party::auth::oauth::AuthorizationState;
//! use oauth_relying_party::SecretKey;
//!
//! let signer = StateSigner::new(SecretKey::new("state", "secret").unwrap());
//! let state = AuthorizationState::generate(&RandomTokenSource::default(), &signer);
//!
//! assert!(signer.verify(state.nonce(), state.signature()));
//! assert!(!signer.verify("forged", state.signature()));
//! ```

mod authorization;
mod begin_auth;
mod error;
mod flow;
pub mod hmac;
mod state;
pub mod token;
mod token_exchange;

pub use authorization::{AuthorizationFlow, FlowOutcome};
pub use begin_auth::{begin_auth, BeginAuthResult};
pub use error::{
    truncate_detail, Failure, OAuthError, CSRF_FAILURE_REASON, INVALID_CALLBACK_REASON,
    MAX_DETAIL_CHARS, NETWORK_FAILURE_REASON,
};
pub use flow::{transition, Command, FlowEvent, FlowState, Transition};
pub use state::{AuthorizationGrant, AuthorizationState, CallbackQuery};
pub use token_exchange::exchange_code;
