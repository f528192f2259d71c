//! Module for the caller's own profile.
//!
//! Profiles are created on first save and must exist before an application
//! can be submitted.

pub mod handlers;
pub mod routes;
