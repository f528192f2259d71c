//! Middleware that attaches the caller's session to every request.
//!
//! Runs before the request gate so the gate can see the caller's role.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::service::AuthService;
use crate::state::AppState;

pub async fn resolve_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = AuthService::new(state.identity.as_ref())
        .session_for(request.headers())
        .await;
    request.extensions_mut().insert(session);
    next.run(request).await
}
