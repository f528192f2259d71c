//! Pages served to browsers: landing, sign-in, the applicant flow, the
//! admin home, the unsubscribe form and the merch puzzle.

pub mod handlers;
pub mod routes;
