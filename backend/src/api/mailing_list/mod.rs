//! Mailing-list subscriptions. Both endpoints are public.

pub mod handlers;
pub mod routes;
