//! Session resolution on top of the configured identity provider.
//!
//! The backend never issues or stores sessions; it only asks the provider
//! who the caller is. Any provider failure is logged and the caller is
//! treated as anonymous, so a broken or forged token can never widen
//! access.

use adapters::{IdentityProvider, Session};
use axum::http::HeaderMap;

use crate::config::IdentityConfig;

pub struct AuthService<'a> {
    identity: &'a dyn IdentityProvider,
}

impl<'a> AuthService<'a> {
    pub fn new(identity: &'a dyn IdentityProvider) -> Self {
        Self { identity }
    }

    pub async fn session_for(&self, headers: &HeaderMap) -> Session {
        match self.identity.resolve(headers).await {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(
                    provider = self.identity.name(),
                    error = %err,
                    "identity check failed, continuing as anonymous"
                );
                Session::anonymous()
            }
        }
    }
}

/// `Set-Cookie` value that clears the session cookie, when the provider
/// reads one.
pub fn expired_session_cookie(config: &IdentityConfig) -> Option<String> {
    match config {
        IdentityConfig::SignedToken { cookie_name, .. } => Some(format!(
            "{cookie_name}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax"
        )),
        IdentityConfig::TrustedHeader => None,
    }
}
