//! Teams. A team is created by an applicant and their application is
//! attached to it.

pub mod handlers;
pub mod routes;
