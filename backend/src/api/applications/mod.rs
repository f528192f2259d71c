//! Application submission.

pub mod handlers;
pub mod routes;
