//! Authentication for the relying party.
//!
//! # Overview
//!
//! - [`oauth`]: The authorization code flow, state signing and token exchange
//! - [`SessionStore`]: Per-user-agent key/value storage the flow reads and writes
//! - [`SessionRegistry`]: In-memory sessions shared by the HTTP server
//! - [`AccessToken`]: The bearer credential kept in a session
//!
//! A session holds at most two values: the signature of a pending
//! authorization state and the access token of a completed login.
//!
//! # Example
//!
//! ```rust
//! use oauth_relying_party::auth::{keys, MemorySession, SessionStore};
//!
//! let mut session = MemorySession::new();
//! assert!(session.access_token().is_none());
//!
//! session.set(keys::ACCESS_TOKEN, "gho_abc".to_string());
//! assert_eq!(session.access_token().unwrap().value(), "gho_abc");
//! ```

pub mod oauth;
pub mod session;

pub use session::{keys, AccessToken, MemorySession, SessionHandle, SessionRegistry, SessionStore};
