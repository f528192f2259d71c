//! Module for core business logic services.
//!
//! This module encapsulates the services that decide what a caller may see
//! and that perform the registration writes, sitting between the HTTP
//! handlers and the data store.

pub mod merch;
pub mod registration;
pub mod resolver;
pub mod review;
