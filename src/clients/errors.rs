//! HTTP-specific error types for outbound calls.
//!
//! - [`HttpResponseError`]: Non-2xx responses from the remote server
//! - [`HttpError`]: Unified error type encompassing all HTTP-related errors
//!
//! # Example
//!
//! ```rust,ignore
//! use oauth_relying_party::clients::{HttpError, ResourceClient};
//!
//! match client.fetch(&token).await {
//!     Ok(payload) => println!("{payload}"),
//!     Err(HttpError::Response(e)) => println!("Resource error {}: {}", e.code, e.message),
//!     Err(HttpError::Network(e)) => println!("Network error: {e}"),
//!     Err(HttpError::InvalidBody { message }) => println!("Bad payload: {message}"),
//! }
//! ```

use thiserror::Error;

/// Error returned when the remote server answers with a non-2xx status.
#[derive(Debug, Error)]
#[error("Request failed with status {code}: {message}")]
pub struct HttpResponseError {
    /// The HTTP status code.
    pub code: u16,
    /// The response body, or a placeholder when it was empty.
    pub message: String,
}

/// Unified error type for outbound HTTP operations.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Non-2xx response.
    #[error(transparent)]
    Response(#[from] HttpResponseError),

    /// DNS, connection, TLS or timeout failure.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("Invalid response body: {message}")]
    InvalidBody {
        /// Why the body was rejected.
        message: String,
    },
}

// Verify HttpError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpError>();
};
