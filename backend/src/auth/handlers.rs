//! Handler functions for the session endpoints.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Redirect, Response},
    Json,
};

use super::models::{CurrentSession, SessionView};
use super::service::expired_session_cookie;
use crate::state::AppState;

/// Who the backend thinks the caller is.
pub async fn whoami(CurrentSession(session): CurrentSession) -> Json<SessionView> {
    Json(session.into())
}

pub async fn sign_out(State(state): State<AppState>) -> Response {
    let redirect = Redirect::to("/");
    match expired_session_cookie(&state.config.identity) {
        Some(cookie) => ([(header::SET_COOKIE, cookie)], redirect).into_response(),
        None => redirect.into_response(),
    }
}
