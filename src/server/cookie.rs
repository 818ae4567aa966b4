//! Signed session cookies.
//!
//! The cookie carries only an opaque session id and its HMAC-SHA256
//! signature under the session secret, `{id}.{hex signature}`. All session
//! data stays server-side in the [`SessionRegistry`](crate::auth::SessionRegistry).

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::auth::oauth::hmac;
use crate::auth::SessionHandle;
use crate::server::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "rp_session";

/// Returns the cookie value for a session id.
#[must_use]
pub fn sign_session_id(secret: &[u8], id: &str) -> String {
    format!("{id}.{}", hmac::sign(secret, id))
}

/// Returns the session id if the cookie value carries a valid signature.
#[must_use]
pub fn verify_session_cookie<'a>(secret: &[u8], value: &'a str) -> Option<&'a str> {
    let (id, signature) = value.rsplit_once('.')?;
    (!id.is_empty() && hmac::verify(secret, id, signature)).then_some(id)
}

/// Opens the caller's session, or creates one and sets its cookie.
///
/// A missing, tampered or expired cookie yields a fresh empty session.
pub(super) fn resume_session(jar: CookieJar, state: &AppState) -> (CookieJar, SessionHandle) {
    let secret: &[u8] = state.flow().config().session_secret().as_ref();

    let existing = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| verify_session_cookie(secret, cookie.value()))
        .and_then(|id| state.sessions().open(id));
    if let Some(handle) = existing {
        return (jar, handle);
    }

    if jar.get(SESSION_COOKIE).is_some() {
        tracing::debug!("Discarding unknown or tampered session cookie");
    }

    let handle = state.sessions().create();
    let cookie = Cookie::build((SESSION_COOKIE, sign_session_id(secret, handle.id())))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    (jar.add(cookie), handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_cookie_verifies() {
        let value = sign_session_id(b"secret", "abc_DEF-123");
        assert_eq!(verify_session_cookie(b"secret", &value), Some("abc_DEF-123"));
    }

    #[test]
    fn test_cookie_with_other_secret_is_rejected() {
        let value = sign_session_id(b"secret", "abc");
        assert_eq!(verify_session_cookie(b"other", &value), None);
    }

    #[test]
    fn test_tampered_or_malformed_cookie_is_rejected() {
        let value = sign_session_id(b"secret", "abc");
        let swapped = value.replacen("abc", "abd", 1);

        for bad in [swapped.as_str(), "abc", "", ".", "abc.", "abc.zz"] {
            assert_eq!(verify_session_cookie(b"secret", bad), None, "{bad}");
        }
    }
}
