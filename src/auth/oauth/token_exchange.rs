//! Authorization code exchange.
//!
//! This module implements the back-channel half of the authorization code
//! grant: a form-encoded `POST` to the token endpoint carrying the client
//! credentials, the grant code and the `redirect_uri` used in the
//! authorization request.
//!
//! The caller must have verified the grant's state before calling
//! [`exchange_code`]. No retry is attempted on failure.

use serde::Serialize;
use serde_json::Value;

use crate::auth::oauth::OAuthError;
use crate::auth::session::AccessToken;
use crate::clients::HttpError;
use crate::config::AppConfig;

/// Form body of the token request.
#[derive(Debug, Serialize)]
struct TokenExchangeRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
}

/// Exchanges a verified grant code for an access token.
///
/// # Errors
///
/// - [`OAuthError::HttpError`] if the token endpoint cannot be reached
/// - [`OAuthError::TokenExchangeFailed`] on a non-2xx response
/// - [`OAuthError::InvalidTokenResponse`] if the body has no string `access_token`
pub async fn exchange_code(
    client: &reqwest::Client,
    config: &AppConfig,
    code: &str,
) -> Result<AccessToken, OAuthError> {
    let redirect_uri = config.redirect_uri();
    let request_body = TokenExchangeRequest {
        client_id: config.client_id().as_ref(),
        client_secret: config.client_secret().as_ref(),
        code,
        redirect_uri: &redirect_uri,
    };

    let response = client
        .post(config.token_endpoint())
        .header(reqwest::header::ACCEPT, "application/json")
        .form(&request_body)
        .send()
        .await
        .map_err(HttpError::from)?;

    let status = response.status();
    let body = response.text().await.map_err(HttpError::from)?;

    if !status.is_success() {
        return Err(OAuthError::TokenExchangeFailed {
            status: status.as_u16(),
            message: body,
        });
    }

    parse_token_response(&body)
}

/// Extracts `access_token` from a token endpoint JSON body.
///
/// Other fields (`token_type`, `scope`, ...) are ignored.
fn parse_token_response(body: &str) -> Result<AccessToken, OAuthError> {
    let json: Value =
        serde_json::from_str(body).map_err(|e| OAuthError::InvalidTokenResponse {
            message: format!("Failed to parse token response: {e}"),
        })?;

    match json.get("access_token").and_then(Value::as_str) {
        Some(token) if !token.is_empty() => Ok(AccessToken::new(token)),
        _ => Err(OAuthError::InvalidTokenResponse {
            message: "Response has no access_token".to_string(),
        }),
    }
}
