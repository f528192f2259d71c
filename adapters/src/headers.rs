//! Adapter for deployments that sit behind an authenticating proxy.
//!
//! The proxy terminates the identity provider's login flow and forwards the
//! verified subject and role as plain headers. Only use this provider when
//! the backend is unreachable except through that proxy.

use async_trait::async_trait;
use http::{HeaderMap, HeaderName};

use crate::errors::IdentityError;
use crate::models::{Role, Session, UserId};
use crate::IdentityProvider;

pub const DEFAULT_USER_HEADER: &str = "x-user-id";
pub const DEFAULT_ROLE_HEADER: &str = "x-user-role";

pub struct TrustedHeaderProvider {
    user_header: HeaderName,
    role_header: HeaderName,
}

impl Default for TrustedHeaderProvider {
    fn default() -> Self {
        Self {
            user_header: HeaderName::from_static(DEFAULT_USER_HEADER),
            role_header: HeaderName::from_static(DEFAULT_ROLE_HEADER),
        }
    }
}

impl TrustedHeaderProvider {
    pub fn new(user_header: HeaderName, role_header: HeaderName) -> Self {
        Self {
            user_header,
            role_header,
        }
    }

    fn header<'a>(&self, headers: &'a HeaderMap, name: &HeaderName) -> Result<Option<&'a str>, IdentityError> {
        match headers.get(name) {
            None => Ok(None),
            Some(value) => value
                .to_str()
                .map(|v| Some(v.trim()).filter(|v| !v.is_empty()))
                .map_err(|_| IdentityError::InvalidHeader(name.to_string())),
        }
    }
}

#[async_trait]
impl IdentityProvider for TrustedHeaderProvider {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Session, IdentityError> {
        let Some(user) = self.header(headers, &self.user_header)? else {
            if headers.contains_key(&self.role_header) {
                log::warn!("role header present without a user header, ignoring");
            }
            return Ok(Session::anonymous());
        };

        let role = self
            .header(headers, &self.role_header)?
            .map(str::parse::<Role>)
            .transpose()?;

        Ok(Session {
            user_id: Some(UserId::new(user)),
            role,
        })
    }

    fn name(&self) -> &'static str {
        "trusted-header"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[tokio::test]
    async fn reads_user_and_role() {
        let session = TrustedHeaderProvider::default()
            .resolve(&headers(&[("x-user-id", "u1"), ("x-user-role", "admin")]))
            .await
            .unwrap();
        assert_eq!(session, Session::authenticated("u1", Some(Role::Admin)));
    }

    #[tokio::test]
    async fn role_without_user_is_anonymous() {
        let session = TrustedHeaderProvider::default()
            .resolve(&headers(&[("x-user-role", "admin")]))
            .await
            .unwrap();
        assert!(session.is_anonymous());
        assert_eq!(session.role, None);
    }

    #[tokio::test]
    async fn unknown_role_is_rejected() {
        let result = TrustedHeaderProvider::default()
            .resolve(&headers(&[("x-user-id", "u1"), ("x-user-role", "owner")]))
            .await;
        assert!(matches!(result, Err(IdentityError::UnknownRole(_))));
    }

    #[tokio::test]
    async fn blank_user_header_is_anonymous() {
        let session = TrustedHeaderProvider::default()
            .resolve(&headers(&[("x-user-id", "  ")]))
            .await
            .unwrap();
        assert!(session.is_anonymous());
    }
}
