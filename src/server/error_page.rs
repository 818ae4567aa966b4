//! The error page and the redirects that lead to it.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use thiserror::Error;

use crate::auth::oauth::{truncate_detail, Failure, MAX_DETAIL_CHARS};
use crate::config::ERROR_PATH;

/// Query parameters of the error page.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ErrorQuery {
    /// Short failure kind. Required.
    pub reason: Option<String>,
    /// Optional detail.
    pub detail: Option<String>,
}

/// The error page was requested without a `reason`.
///
/// This is a routing error, not a flow failure, and renders as `404`.
#[derive(Debug, Error)]
#[error("Error page requested without a reason")]
pub struct MissingReason;

impl IntoResponse for MissingReason {
    fn into_response(self) -> Response {
        (StatusCode::NOT_FOUND, "Not Found").into_response()
    }
}

impl ErrorQuery {
    /// Renders the page, or fails if `reason` is missing or empty.
    ///
    /// # Errors
    ///
    /// Returns [`MissingReason`] when there is nothing to show.
    pub fn render(&self) -> Result<String, MissingReason> {
        let reason = self
            .reason
            .as_deref()
            .filter(|reason| !reason.is_empty())
            .ok_or(MissingReason)?;
        let detail = self.detail.as_deref().filter(|detail| !detail.is_empty());
        Ok(render_error_page(reason, detail))
    }
}

/// Renders the HTML error page. Both values are HTML-escaped.
#[must_use]
pub fn render_error_page(reason: &str, detail: Option<&str>) -> String {
    let mut body = format!("<body><h1>{}</h1>", escape_html(reason));
    if let Some(detail) = detail {
        body.push_str(&format!("<p>{}</p>", escape_html(detail)));
    }
    body.push_str("</body>");
    format!("<head><title>Error</title></head>\n{body}")
}

/// Returns the error page location for a failure.
///
/// The detail is cut to [`MAX_DETAIL_CHARS`] so the `Location` header stays
/// small whatever the upstream server sent.
#[must_use]
pub fn error_location(failure: &Failure) -> String {
    let mut location = format!("{ERROR_PATH}?reason={}", urlencoding::encode(&failure.reason));
    if let Some(detail) = &failure.detail {
        location.push_str("&detail=");
        location.push_str(&urlencoding::encode(&truncate_detail(detail)));
    }
    location
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}
