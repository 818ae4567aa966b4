//! HTTP client for the protected resource.
//!
//! This module provides [`build_http_client`], which creates the single
//! process-wide `reqwest::Client`, and [`ResourceClient`], which performs
//! the authenticated call to the protected resource on behalf of the user.

use serde_json::{Map, Value};

use crate::auth::session::AccessToken;
use crate::clients::errors::{HttpError, HttpResponseError};
use crate::config::AppConfig;

/// Crate version, sent in the `User-Agent` header.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Builds the outbound HTTP client with the configured timeout.
///
/// The timeout bounds the whole request, so a hung authorization server
/// cannot block a handler indefinitely.
///
/// # Errors
///
/// Returns [`HttpError::Network`] if the TLS backend cannot be initialized.
pub fn build_http_client(config: &AppConfig) -> Result<reqwest::Client, HttpError> {
    let client = reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(config.http_timeout())
        .user_agent(format!("oauth-relying-party v{CLIENT_VERSION}"))
        .build()?;
    Ok(client)
}

/// Calls the protected resource with a stored access token.
#[derive(Clone, Debug)]
pub struct ResourceClient {
    client: reqwest::Client,
    endpoint: String,
}

// Verify ResourceClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ResourceClient>();
};

impl ResourceClient {
    /// Creates a client for `endpoint` sharing the given `reqwest::Client`.
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Returns the resource URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetches the resource as JSON, sending `Authorization: token {token}`.
    ///
    /// The payload is returned unchanged. An expired or revoked token is not
    /// detected here; the server's rejection surfaces as
    /// [`HttpError::Response`].
    ///
    /// # Errors
    ///
    /// - [`HttpError::Network`] if the server cannot be reached
    /// - [`HttpError::Response`] on a non-2xx status
    /// - [`HttpError::InvalidBody`] if the body is not JSON
    pub async fn fetch(&self, token: &AccessToken) -> Result<Value, HttpError> {
        let response = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(
                reqwest::header::AUTHORIZATION,
                format!("token {}", token.value()),
            )
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Protected resource rejected request");
            let message = if body.is_empty() {
                status.canonical_reason().unwrap_or("empty response").to_string()
            } else {
                body
            };
            return Err(HttpResponseError {
                code: status.as_u16(),
                message,
            }
            .into());
        }

        serde_json::from_str(&body).map_err(|e| HttpError::InvalidBody {
            message: e.to_string(),
        })
    }
}

/// Renders a payload as pretty JSON with sorted keys and 4-space indentation.
#[must_use]
pub fn render_payload(payload: &Value) -> String {
    let sorted = sort_keys(payload.clone());
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    // Serializing a Value into memory cannot fail
    if serde::Serialize::serialize(&sorted, &mut serializer).is_err() {
        return sorted.to_string();
    }
    String::from_utf8(out).unwrap_or_else(|_| sorted.to_string())
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
