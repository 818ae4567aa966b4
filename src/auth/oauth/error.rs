//! OAuth-specific error types.
//!
//! This module contains error types for flow failures and the
//! [`Failure`] pair they are presented as.
//!
//! # Error Types
//!
//! - [`OAuthError::CsrfMismatch`]: The presented state does not verify
//! - [`OAuthError::InvalidCallback`]: The callback query is malformed
//! - [`OAuthError::TokenExchangeFailed`]: The token endpoint refused the grant
//! - [`OAuthError::InvalidTokenResponse`]: The token endpoint answered without a token
//! - [`OAuthError::HttpError`]: Wrapped HTTP client error
//!
//! # Example
//!
//! ```rust
//! use oauth_relying_party::auth::oauth::OAuthError;
//!
//! let failure = OAuthError::CsrfMismatch.failure();
//! assert_eq!(failure.reason, "CSRF verification failed");
//! ```

use crate::clients::HttpError;
use thiserror::Error;

/// Reason shown for a state verification failure.
pub const CSRF_FAILURE_REASON: &str = "CSRF verification failed";

/// Reason shown for any failure talking to a remote server.
pub const NETWORK_FAILURE_REASON: &str = "NetworkError";

/// Reason shown when the callback query cannot be parsed.
pub const INVALID_CALLBACK_REASON: &str = "Invalid callback request";

/// Longest failure detail kept, in characters.
///
/// Details travel in the error page redirect, so upstream bodies are cut
/// to this length.
pub const MAX_DETAIL_CHARS: usize = 512;

/// Errors that can occur during the authorization code flow.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// The presented state was not issued by this session.
    ///
    /// No token exchange is attempted after this error.
    #[error("State parameter failed signature verification")]
    CsrfMismatch,

    /// The token endpoint returned a non-success HTTP status.
    #[error("Token exchange failed with status {status}: {message}")]
    TokenExchangeFailed {
        /// The HTTP status code returned.
        status: u16,
        /// The response body.
        message: String,
    },

    /// The callback query string could not be parsed.
    ///
    /// No session state is read and no token exchange is attempted.
    #[error("Malformed callback query: {message}")]
    InvalidCallback {
        /// Why the query was rejected.
        message: String,
    },

    /// The token endpoint answered 2xx without a usable `access_token`.
    #[error("Invalid token response: {message}")]
    InvalidTokenResponse {
        /// What was wrong with the response.
        message: String,
    },

    /// Wrapped HTTP client error.
    #[error(transparent)]
    HttpError(#[from] HttpError),
}

impl OAuthError {
    /// Converts the error into the reason/detail pair shown to the user.
    #[must_use]
    pub fn failure(&self) -> Failure {
        match self {
            Self::CsrfMismatch => Failure::new(CSRF_FAILURE_REASON, None),
            Self::InvalidCallback { message } => {
                Failure::new(INVALID_CALLBACK_REASON, Some(message.clone()))
            }
            other => Failure::new(NETWORK_FAILURE_REASON, Some(other.to_string())),
        }
    }
}

// Verify OAuthError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OAuthError>();
};

/// A failure as rendered by the error page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Failure {
    /// Short failure kind.
    pub reason: String,
    /// Optional human-readable detail.
    pub detail: Option<String>,
}

impl Failure {
    /// Creates a failure pair, cutting `detail` to [`MAX_DETAIL_CHARS`].
    #[must_use]
    pub fn new(reason: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            reason: reason.into(),
            detail: detail.map(|detail| truncate_detail(&detail)),
        }
    }
}

/// Cuts `detail` to [`MAX_DETAIL_CHARS`] on a character boundary.
///
/// A cut value ends in `...`.
#[must_use]
pub fn truncate_detail(detail: &str) -> String {
    match detail.char_indices().nth(MAX_DETAIL_CHARS) {
        Some((end, _)) => format!("{}...", &detail[..end]),
        None => detail.to_string(),
    }
}

impl From<HttpError> for Failure {
    fn from(error: HttpError) -> Self {
        OAuthError::from(error).failure()
    }
}
