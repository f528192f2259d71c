//! Request-scoped authentication types.
//!
//! The session middleware stores a [`Session`] in the request extensions;
//! these extractors read it back for handlers. A request that never passed
//! through the middleware is treated as anonymous.

use adapters::{Role, Session, UserId};
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Serialize;
use std::convert::Infallible;

use super::errors::AuthError;
use crate::state::AppState;

fn session_of(parts: &Parts) -> Session {
    parts.extensions.get::<Session>().cloned().unwrap_or_default()
}

/// The caller's session, anonymous or not.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentSession(session_of(parts)))
    }
}

/// A signed-in caller. Anonymous requests are rejected with 401.
#[derive(Debug, Clone)]
pub struct SignedInUser {
    pub user_id: UserId,
    pub role: Option<Role>,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for SignedInUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = session_of(parts);
        let user_id = session.user_id.ok_or(AuthError::Unauthenticated)?;
        Ok(SignedInUser {
            user_id,
            role: session.role,
        })
    }
}

/// A caller holding the configured privileged role.
///
/// Anonymous callers are sent to sign in, everyone else without the role
/// gets 403.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub user_id: UserId,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = session_of(parts);
        let required = state.config.gate.privileged_role;

        let Some(user_id) = session.user_id.clone() else {
            return Err(AuthError::SignInRequired);
        };
        if !session.has_role(required) {
            tracing::debug!(user = %user_id, role = %required, "admin route refused");
            return Err(AuthError::MissingRole(required.to_string()));
        }

        Ok(AdminUser { user_id })
    }
}

/// Body of `GET /auth/session`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub signed_in: bool,
    pub user_id: Option<UserId>,
    pub role: Option<Role>,
}

impl From<Session> for SessionView {
    fn from(session: Session) -> Self {
        Self {
            signed_in: !session.is_anonymous(),
            user_id: session.user_id,
            role: session.role,
        }
    }
}
