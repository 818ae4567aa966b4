//! Error types for application configuration.
//!
//! All configuration constructors return `Result<T, ConfigError>` so the
//! binary fails fast at startup instead of discovering a bad value on the
//! first login attempt.
//!
//! # Example
//!
//! ```rust
//! use oauth_relying_party::{ClientId, ConfigError};
//!
//! let result = ClientId::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyClientId)));
//! ```

use thiserror::Error;

/// Errors that can occur while building the application configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Client id cannot be empty.
    #[error("Client id cannot be empty. Please provide the id issued by the authorization server.")]
    EmptyClientId,

    /// Client secret cannot be empty.
    #[error("Client secret cannot be empty. Please provide the secret issued by the authorization server.")]
    EmptyClientSecret,

    /// A signing secret was explicitly provided but is empty.
    #[error("Secret '{name}' cannot be empty.")]
    EmptySecret {
        /// Which secret was empty.
        name: &'static str,
    },

    /// A URL value is malformed.
    #[error("Invalid URL '{url}'. Please provide a valid URL with scheme (e.g., 'http://localhost:6000').")]
    InvalidUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// The nonce entropy is outside the accepted range.
    #[error("Invalid entropy of {bytes} bytes. Expected between {min} and {max} bytes.")]
    InvalidEntropy {
        /// The requested entropy in bytes.
        bytes: usize,
        /// Smallest accepted value.
        min: usize,
        /// Largest accepted value.
        max: usize,
    },

    /// An environment variable could not be parsed.
    #[error("Invalid value '{value}' for {var}: {reason}")]
    InvalidEnvVar {
        /// The variable name.
        var: &'static str,
        /// The raw value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },
}
