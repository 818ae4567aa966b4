//! Route handlers.
//!
//! Handlers translate between HTTP and [`FlowOutcome`]; they never return
//! a flow error to the user agent directly. Failures become a redirect to
//! the error page.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::oauth::{CallbackQuery, FlowOutcome, OAuthError};
use crate::clients::render_payload;
use crate::config::SERVICE_PATH;
use crate::server::cookie::resume_session;
use crate::server::error_page::{error_location, ErrorQuery, MissingReason};
use crate::server::AppState;

pub(super) async fn index() -> Redirect {
    Redirect::to(SERVICE_PATH)
}

pub(super) async fn service(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, mut session) = resume_session(jar, &state);
    let outcome = state.flow().service(&mut session).await;
    (jar, respond(outcome)).into_response()
}

pub(super) async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    query: Result<Query<CallbackQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Rejected malformed callback");
            let failure = OAuthError::InvalidCallback {
                message: rejection.body_text(),
            }
            .failure();
            return respond(FlowOutcome::Failed(failure));
        }
    };

    let (jar, mut session) = resume_session(jar, &state);
    let outcome = state.flow().callback(&mut session, query).await;
    (jar, respond(outcome)).into_response()
}

pub(super) async fn error(Query(query): Query<ErrorQuery>) -> Result<Html<String>, MissingReason> {
    query.render().map(Html)
}

fn respond(outcome: FlowOutcome) -> Response {
    match outcome {
        FlowOutcome::Redirect(location) => Redirect::to(&location).into_response(),
        FlowOutcome::Payload(payload) => (
            [(header::CONTENT_TYPE, "application/json")],
            render_payload(&payload),
        )
            .into_response(),
        FlowOutcome::Failed(failure) => {
            tracing::info!(reason = %failure.reason, "Redirecting to error page");
            Redirect::to(&error_location(&failure)).into_response()
        }
    }
}
