//! Core `adapters` crate for abstracting the upstream identity provider.
//!
//! This crate defines the `IdentityProvider` trait, which turns the headers of
//! an incoming request into a [`Session`], and provides the concrete
//! implementations the backend can be configured with: signed session tokens
//! issued by the external provider, and trusted headers injected by an
//! authenticating proxy.

pub mod errors;
pub mod headers;
pub mod models;
pub mod signed;

use async_trait::async_trait;
use http::HeaderMap;

pub use errors::IdentityError;
pub use headers::TrustedHeaderProvider;
pub use models::{Claims, Role, Session, UserId};
pub use signed::{SignedTokenProvider, TokenIssuer};

/// Resolves the caller's session from request headers.
///
/// Implementations return `Ok(Session::anonymous())` when the request carries
/// no credentials at all, and an error when credentials are present but cannot
/// be trusted.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Session, IdentityError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}
