//! Admin review endpoints under `/dashboard/admin`.
//!
//! Every handler takes an [`AdminUser`](crate::auth::AdminUser), so callers
//! without the privileged role never reach the store. The applicant resolver
//! is not consulted here.

pub mod handlers;
pub mod routes;
