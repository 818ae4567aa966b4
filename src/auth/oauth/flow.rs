//! The authorization code flow as an explicit state machine.
//!
//! [`transition`] is a pure function from a [`FlowState`] and a
//! [`FlowEvent`] to the next state plus the single [`Command`] the caller
//! must carry out. It performs no I/O, so every path, including the CSRF
//! checks, can be exercised without an HTTP layer.
//!
//! ```text
//! LoggedOut --ResourceRequested--> (BeginAuthorization)
//!           --AuthorizationStarted--> PendingAuthorization
//! PendingAuthorization --CallbackReceived(valid)--> (ExchangeGrant)
//!           --TokenIssued--> LoggedIn
//! any --CallbackReceived(invalid) | RemoteFailed--> Failed
//! ```

use crate::auth::oauth::error::{Failure, OAuthError};
use crate::auth::oauth::hmac::StateSigner;
use crate::auth::oauth::state::CallbackQuery;
use crate::auth::session::{keys, AccessToken, SessionStore};

/// Where a user agent is in the login flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowState {
    /// No access token and no pending authorization.
    LoggedOut,
    /// A signed state has been issued and awaits its callback.
    ///
    /// `token` carries an existing login across a re-authorization.
    PendingAuthorization {
        /// Signature of the issued nonce.
        signature: String,
        /// Token from an earlier login, if any.
        token: Option<AccessToken>,
    },
    /// An access token is stored.
    LoggedIn {
        /// The stored token.
        token: AccessToken,
    },
    /// The current request failed.
    Failed(Failure),
}

impl FlowState {
    /// Reads the state a session is in.
    ///
    /// `Failed` is never derived from a session, it only lives for the
    /// request that produced it.
    #[must_use]
    pub fn from_session(session: &dyn SessionStore) -> Self {
        Self::from_entries(session.get(keys::STATE_SIGNATURE), session.access_token())
    }

    /// Builds the state from a pending signature and a stored token.
    ///
    /// A pending signature takes precedence over the token.
    #[must_use]
    pub fn from_entries(pending_signature: Option<String>, token: Option<AccessToken>) -> Self {
        match pending_signature {
            Some(signature) => Self::PendingAuthorization { signature, token },
            None => token.map_or(Self::LoggedOut, |token| Self::LoggedIn { token }),
        }
    }

    /// The access token held in this state, if any.
    #[must_use]
    pub const fn token(&self) -> Option<&AccessToken> {
        match self {
            Self::LoggedIn { token } | Self::PendingAuthorization {
                token: Some(token), ..
            } => Some(token),
            _ => None,
        }
    }

    fn without_pending(self) -> Self {
        match self {
            Self::PendingAuthorization {
                token: Some(token), ..
            } => Self::LoggedIn { token },
            Self::PendingAuthorization { token: None, .. } => Self::LoggedOut,
            other => other,
        }
    }
}

/// Something that happened to the flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowEvent {
    /// The protected resource was requested.
    ResourceRequested,
    /// The callback endpoint was hit.
    CallbackReceived(CallbackQuery),
    /// A signed state was stored and an authorization URL built.
    AuthorizationStarted {
        /// Signature stored in the session.
        signature: String,
        /// Where to send the user agent.
        auth_url: String,
    },
    /// The token endpoint issued an access token.
    TokenIssued(AccessToken),
    /// A call to a remote server failed.
    RemoteFailed(Failure),
}

/// The effect the caller must perform after a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Issue a new signed state and build the authorization URL.
    BeginAuthorization,
    /// Redirect the user agent to the authorization server.
    RedirectToAuthorization {
        /// Complete authorization URL.
        auth_url: String,
    },
    /// Exchange a verified grant code for a token.
    ExchangeGrant {
        /// The grant code.
        code: String,
    },
    /// Call the protected resource.
    FetchResource {
        /// Token to authenticate with.
        token: AccessToken,
    },
    /// Store the token and redirect to the protected resource.
    CompleteLogin {
        /// The newly issued token.
        token: AccessToken,
    },
    /// Show the failure page.
    Present(Failure),
}

/// Result of [`transition`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    /// The next state.
    pub state: FlowState,
    /// What the caller must do next.
    pub command: Command,
}

impl Transition {
    const fn new(state: FlowState, command: Command) -> Self {
        Self { state, command }
    }
}

/// Computes the next state of the flow.
///
/// A callback carrying a `code` always consumes the pending state, whether
/// or not it verifies, so the same `code`/`state` pair can never be
/// exchanged twice.
#[must_use]
pub fn transition(state: FlowState, event: FlowEvent, signer: &StateSigner) -> Transition {
    match event {
        FlowEvent::ResourceRequested => {
            let token = state.token().cloned();
            match token {
                Some(token) => Transition::new(state, Command::FetchResource { token }),
                None => Transition::new(state, Command::BeginAuthorization),
            }
        }

        FlowEvent::CallbackReceived(query) => {
            let Some(grant) = query.into_grant() else {
                return Transition::new(state, Command::BeginAuthorization);
            };

            let verified = match &state {
                FlowState::PendingAuthorization { signature, .. } => {
                    signer.verify(&grant.state, signature)
                }
                _ => false,
            };

            if verified {
                Transition::new(
                    state.without_pending(),
                    Command::ExchangeGrant { code: grant.code },
                )
            } else {
                let failure = OAuthError::CsrfMismatch.failure();
                Transition::new(
                    FlowState::Failed(failure.clone()),
                    Command::Present(failure),
                )
            }
        }

        FlowEvent::AuthorizationStarted {
            signature,
            auth_url,
        } => {
            let token = state.token().cloned();
            Transition::new(
                FlowState::PendingAuthorization { signature, token },
                Command::RedirectToAuthorization { auth_url },
            )
        }

        FlowEvent::TokenIssued(token) => Transition::new(
            FlowState::LoggedIn {
                token: token.clone(),
            },
            Command::CompleteLogin { token },
        ),

        FlowEvent::RemoteFailed(failure) => Transition::new(
            FlowState::Failed(failure.clone()),
            Command::Present(failure),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::MemorySession;
    use crate::config::SecretKey;

    fn signer() -> StateSigner {
        StateSigner::new(SecretKey::new("state", "k").unwrap())
    }

    fn pending(nonce: &str, token: Option<AccessToken>) -> FlowState {
        FlowState::PendingAuthorization {
            signature: signer().sign(nonce),
            token,
        }
    }

    fn callback(code: Option<&str>, state: Option<&str>) -> FlowEvent {
        FlowEvent::CallbackReceived(CallbackQuery {
            code: code.map(String::from),
            state: state.map(String::from),
        })
    }

    #[test]
    fn test_from_session_reads_each_state() {
        let mut session = MemorySession::new();
        assert_eq!(FlowState::from_session(&session), FlowState::LoggedOut);

        session.set(keys::ACCESS_TOKEN, "tok".to_string());
        assert_eq!(
            FlowState::from_session(&session),
            FlowState::LoggedIn {
                token: AccessToken::new("tok")
            }
        );

        session.set(keys::STATE_SIGNATURE, "sig".to_string());
        assert_eq!(
            FlowState::from_session(&session),
            FlowState::PendingAuthorization {
                signature: "sig".to_string(),
                token: Some(AccessToken::new("tok")),
            }
        );
    }

    #[test]
    fn test_from_entries_prefers_pending_signature() {
        assert_eq!(FlowState::from_entries(None, None), FlowState::LoggedOut);
        assert_eq!(
            FlowState::from_entries(Some("sig".to_string()), None),
            FlowState::PendingAuthorization {
                signature: "sig".to_string(),
                token: None,
            }
        );
    }

    #[test]
    fn test_resource_request_when_logged_out_begins_authorization() {
        let step = transition(FlowState::LoggedOut, FlowEvent::ResourceRequested, &signer());
        assert_eq!(step.command, Command::BeginAuthorization);
        assert_eq!(step.state, FlowState::LoggedOut);
    }

    #[test]
    fn test_resource_request_when_logged_in_fetches() {
        let token = AccessToken::new("tok");
        let step = transition(
            FlowState::LoggedIn {
                token: token.clone(),
            },
            FlowEvent::ResourceRequested,
            &signer(),
        );
        assert_eq!(step.command, Command::FetchResource { token });
    }

    #[test]
    fn test_authorization_started_moves_to_pending() {
        let step = transition(
            FlowState::LoggedOut,
            FlowEvent::AuthorizationStarted {
                signature: "sig".to_string(),
                auth_url: "http://auth/authorize".to_string(),
            },
            &signer(),
        );
        assert_eq!(
            step.state,
            FlowState::PendingAuthorization {
                signature: "sig".to_string(),
                token: None,
            }
        );
        assert_eq!(
            step.command,
            Command::RedirectToAuthorization {
                auth_url: "http://auth/authorize".to_string()
            }
        );
    }

    #[test]
    fn test_callback_without_code_begins_authorization_from_any_state() {
        for state in [
            FlowState::LoggedOut,
            pending("abc", None),
            FlowState::LoggedIn {
                token: AccessToken::new("tok"),
            },
        ] {
            for event in [callback(None, None), callback(None, Some("abc"))] {
                let step = transition(state.clone(), event, &signer());
                assert_eq!(step.command, Command::BeginAuthorization);
            }
        }
    }

    #[test]
    fn test_valid_callback_exchanges_grant_and_consumes_state() {
        let step = transition(
            pending("abc123", None),
            callback(Some("code-1"), Some("abc123")),
            &signer(),
        );
        assert_eq!(
            step.command,
            Command::ExchangeGrant {
                code: "code-1".to_string()
            }
        );
        assert_eq!(step.state, FlowState::LoggedOut);
    }

    #[test]
    fn test_valid_reauthorization_keeps_previous_token_until_exchange() {
        let token = AccessToken::new("old");
        let step = transition(
            pending("abc123", Some(token.clone())),
            callback(Some("code-1"), Some("abc123")),
            &signer(),
        );
        assert_eq!(step.state, FlowState::LoggedIn { token });
    }

    #[test]
    fn test_unissued_state_is_csrf_failure() {
        let step = transition(
            pending("abc123", None),
            callback(Some("code-1"), Some("attacker-chosen")),
            &signer(),
        );
        assert_eq!(
            step.command,
            Command::Present(Failure::new("CSRF verification failed", None))
        );
        assert!(matches!(step.state, FlowState::Failed(_)));
    }

    #[test]
    fn test_callback_with_code_but_no_pending_state_is_csrf_failure() {
        for state in [
            FlowState::LoggedOut,
            FlowState::LoggedIn {
                token: AccessToken::new("tok"),
            },
        ] {
            let step = transition(state, callback(Some("code"), Some("abc123")), &signer());
            assert!(matches!(step.command, Command::Present(_)));
        }
    }

    #[test]
    fn test_callback_with_code_and_missing_state_is_csrf_failure() {
        let step = transition(pending("abc123", None), callback(Some("code"), None), &signer());
        assert!(matches!(step.command, Command::Present(_)));
    }

    #[test]
    fn test_state_signed_with_other_secret_is_rejected() {
        let foreign = StateSigner::new(SecretKey::new("state", "other").unwrap());
        let state = FlowState::PendingAuthorization {
            signature: foreign.sign("abc123"),
            token: None,
        };
        let step = transition(state, callback(Some("code"), Some("abc123")), &signer());
        assert!(matches!(step.command, Command::Present(_)));
    }

    #[test]
    fn test_token_issued_logs_in() {
        let token = AccessToken::new("new");
        let step = transition(
            FlowState::LoggedOut,
            FlowEvent::TokenIssued(token.clone()),
            &signer(),
        );
        assert_eq!(
            step.state,
            FlowState::LoggedIn {
                token: token.clone()
            }
        );
        assert_eq!(step.command, Command::CompleteLogin { token });
    }

    #[test]
    fn test_remote_failure_is_presented_from_any_state() {
        let failure = Failure::new("NetworkError", Some("connection refused".to_string()));
        for state in [
            FlowState::LoggedOut,
            pending("abc", None),
            FlowState::LoggedIn {
                token: AccessToken::new("tok"),
            },
        ] {
            let step = transition(state, FlowEvent::RemoteFailed(failure.clone()), &signer());
            assert_eq!(step.state, FlowState::Failed(failure.clone()));
            assert_eq!(step.command, Command::Present(failure.clone()));
        }
    }
}
