//! Data models shared by every identity provider adapter.
//!
//! These types describe what the backend learns about a caller: an optional
//! user identifier and an optional role claim. Adapters produce them, the
//! backend only ever reads them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::IdentityError;

/// Stable identifier assigned to a user by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Role claim carried by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Applicant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Applicant => "applicant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "applicant" => Ok(Role::Applicant),
            other => Err(IdentityError::UnknownRole(other.to_string())),
        }
    }
}

/// What the identity provider vouches for on a single request.
///
/// An absent `user_id` means the caller is anonymous. A session is never
/// persisted by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Option<UserId>,
    pub role: Option<Role>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user_id: impl Into<UserId>, role: Option<Role>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            role,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == Some(role)
    }
}

/// Claims embedded in a signed session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the user id.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Expiry as unix seconds.
    pub exp: i64,
}

impl Claims {
    pub fn new(sub: impl Into<String>, role: Option<Role>, exp: i64) -> Self {
        Self {
            sub: sub.into(),
            role: role.map(|r| r.as_str().to_string()),
            exp,
        }
    }

    /// Converts verified claims into a session, rejecting unknown roles.
    pub fn into_session(self) -> Result<Session, IdentityError> {
        if self.sub.trim().is_empty() {
            return Err(IdentityError::MalformedToken("empty subject".to_string()));
        }
        let role = self.role.as_deref().map(Role::from_str).transpose()?;
        Ok(Session::authenticated(self.sub, role))
    }
}
