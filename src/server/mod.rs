//! The HTTP surface of the relying party.
//!
//! # Routes
//!
//! | Path | Behavior |
//! |------|----------|
//! | `/` | `303` redirect to `/service` |
//! | `/service` | Protected resource as pretty JSON, or a redirect to log in |
//! | `/service/callback` | Begins or completes the authorization code flow |
//! | `/error` | HTML error page for `reason` and optional `detail` |
//!
//! Every request is tied to a server-side session through a signed
//! `rp_session` cookie; see [`SESSION_COOKIE`].
//!
//! # Example
//!
//! ```rust,ignore
//! use oauth_relying_party::server::{router, AppState};
//!
//! let state = AppState::from_config(config)?;
//! let listener = tokio::net::TcpListener::bind(addr).await?;
//! axum::serve(listener, router(state)).await?;
//! ```

mod cookie;
mod error_page;
mod handlers;

use axum::routing::get;
use axum::Router;
use std::sync::Arc;

use crate::auth::oauth::AuthorizationFlow;
use crate::auth::SessionRegistry;
use crate::clients::HttpError;
use crate::config::{AppConfig, CALLBACK_PATH, ERROR_PATH, SERVICE_PATH};

pub use cookie::{sign_session_id, verify_session_cookie, SESSION_COOKIE};
pub use error_page::{error_location, render_error_page, ErrorQuery, MissingReason};

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    flow: Arc<AuthorizationFlow>,
    sessions: SessionRegistry,
}

// Verify AppState is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AppState>();
};

impl AppState {
    /// Creates state from a flow and a session registry.
    #[must_use]
    pub fn new(flow: AuthorizationFlow, sessions: SessionRegistry) -> Self {
        Self {
            flow: Arc::new(flow),
            sessions,
        }
    }

    /// Builds the flow, its HTTP client and an empty session registry.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the outbound HTTP client cannot be built.
    pub fn from_config(config: AppConfig) -> Result<Self, HttpError> {
        let flow = AuthorizationFlow::new(Arc::new(config))?;
        Ok(Self::new(flow, SessionRegistry::new()))
    }

    /// Returns the authorization flow.
    #[must_use]
    pub fn flow(&self) -> &AuthorizationFlow {
        &self.flow
    }

    /// Returns the session registry.
    #[must_use]
    pub const fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route(SERVICE_PATH, get(handlers::service))
        .route(CALLBACK_PATH, get(handlers::callback))
        .route(ERROR_PATH, get(handlers::error))
        .with_state(state)
}
