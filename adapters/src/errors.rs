//! Custom error types specific to the `adapters` crate.
//!
//! Every identity provider reports failures through [`IdentityError`]. The
//! backend treats any of them as "no verified role" and keeps going on the
//! stricter path, so the variants exist for logging rather than for recovery.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("malformed session token: {0}")]
    MalformedToken(String),

    #[error("session token signature does not verify")]
    InvalidSignature,

    #[error("session token expired at {0}")]
    Expired(i64),

    #[error("unknown role claim '{0}'")]
    UnknownRole(String),

    #[error("invalid issuer key: {0}")]
    InvalidKey(String),

    #[error("invalid identity header '{0}'")]
    InvalidHeader(String),
}
