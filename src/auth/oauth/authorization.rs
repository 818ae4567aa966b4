//! The authorization flow driver.
//!
//! [`AuthorizationFlow`] runs the pure state machine from
//! [`flow`](crate::auth::oauth::flow) against a real session, performing the
//! commands it emits: issuing signed state, exchanging grants and calling
//! the protected resource.
//!
//! Every outcome is a [`FlowOutcome`]. Errors never escape as faults; they
//! become [`FlowOutcome::Failed`] carrying the reason/detail pair for the
//! error page.

use serde_json::Value;
use std::sync::Arc;

use crate::auth::oauth::begin_auth::{begin_auth, BeginAuthResult};
use crate::auth::oauth::error::Failure;
use crate::auth::oauth::flow::{transition, Command, FlowEvent, FlowState, Transition};
use crate::auth::oauth::hmac::StateSigner;
use crate::auth::oauth::state::CallbackQuery;
use crate::auth::oauth::token::RandomTokenSource;
use crate::auth::oauth::token_exchange::exchange_code;
use crate::auth::session::{keys, SessionStore};
use crate::clients::{build_http_client, HttpError, ResourceClient};
use crate::config::{AppConfig, SERVICE_PATH};

/// What the HTTP layer should send back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Redirect the user agent to this location.
    Redirect(String),
    /// The protected resource's JSON payload, unchanged.
    Payload(Value),
    /// Show the error page.
    Failed(Failure),
}

/// Drives the authorization code flow for one application.
#[derive(Clone, Debug)]
pub struct AuthorizationFlow {
    config: Arc<AppConfig>,
    signer: StateSigner,
    tokens: RandomTokenSource,
    http: reqwest::Client,
    resources: ResourceClient,
}

// Verify AuthorizationFlow is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AuthorizationFlow>();
};

impl AuthorizationFlow {
    /// Creates a flow with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the HTTP client cannot be built.
    pub fn new(config: Arc<AppConfig>) -> Result<Self, HttpError> {
        let http = build_http_client(&config)?;
        Ok(Self::with_client(config, http))
    }

    /// Creates a flow around an existing `reqwest::Client`.
    #[must_use]
    pub fn with_client(config: Arc<AppConfig>, http: reqwest::Client) -> Self {
        let signer = StateSigner::new(config.state_secret().clone());
        let tokens = RandomTokenSource::new(config.state_entropy());
        let resources = ResourceClient::new(http.clone(), config.resource_endpoint());
        Self {
            config,
            signer,
            tokens,
            http,
            resources,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Issues a new signed state, stores its signature and builds the URL.
    ///
    /// Any earlier pending state in the session is replaced.
    pub fn begin(&self, session: &mut dyn SessionStore) -> BeginAuthResult {
        let result = begin_auth(&self.config, &self.tokens, &self.signer);
        session.set(keys::STATE_SIGNATURE, result.state.signature().to_string());
        result
    }

    /// Handles a request for the protected resource.
    pub async fn service(&self, session: &mut dyn SessionStore) -> FlowOutcome {
        let state = FlowState::from_session(session);
        let step = transition(state, FlowEvent::ResourceRequested, &self.signer);
        self.run(session, step).await
    }

    /// Handles the callback endpoint, beginning or completing a login.
    ///
    /// A callback that carries a `code` removes the pending state from the
    /// session before anything else happens, so it is consumed exactly once.
    pub async fn callback(
        &self,
        session: &mut dyn SessionStore,
        query: CallbackQuery,
    ) -> FlowOutcome {
        let state = if query.code.is_some() {
            let pending = session.take(keys::STATE_SIGNATURE);
            FlowState::from_entries(pending, session.access_token())
        } else {
            FlowState::from_session(session)
        };
        let step = transition(state, FlowEvent::CallbackReceived(query), &self.signer);
        self.run(session, step).await
    }

    async fn run(&self, session: &mut dyn SessionStore, mut step: Transition) -> FlowOutcome {
        loop {
            tracing::debug!(command = ?step.command, "Flow transition");

            let event = match step.command {
                Command::BeginAuthorization => {
                    let begun = self.begin(session);
                    FlowEvent::AuthorizationStarted {
                        signature: begun.state.signature().to_string(),
                        auth_url: begun.auth_url,
                    }
                }
                Command::RedirectToAuthorization { auth_url } => {
                    return FlowOutcome::Redirect(auth_url);
                }
                Command::ExchangeGrant { code } => {
                    match exchange_code(&self.http, &self.config, &code).await {
                        Ok(token) => FlowEvent::TokenIssued(token),
                        Err(e) => {
                            tracing::warn!(error = %e, "Token exchange failed");
                            FlowEvent::RemoteFailed(e.failure())
                        }
                    }
                }
                Command::FetchResource { token } => match self.resources.fetch(&token).await {
                    Ok(payload) => return FlowOutcome::Payload(payload),
                    Err(e) => {
                        tracing::warn!(error = %e, "Protected resource call failed");
                        FlowEvent::RemoteFailed(e.into())
                    }
                },
                Command::CompleteLogin { token } => {
                    session.set(keys::ACCESS_TOKEN, token.value().to_string());
                    tracing::info!("Login completed");
                    return FlowOutcome::Redirect(SERVICE_PATH.to_string());
                }
                Command::Present(failure) => {
                    if failure.detail.is_none() {
                        tracing::warn!(reason = %failure.reason, "Authorization rejected");
                    }
                    return FlowOutcome::Failed(failure);
                }
            };

            step = transition(step.state, event, &self.signer);
        }
    }
}
