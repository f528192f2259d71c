//! General-purpose middleware for the API.
//!
//! This module contains the request-level interceptors applied to the whole
//! Axum router, most importantly the date-based request gate.

pub mod gate;

pub use gate::{evaluate, path_matches, request_gate, GateContext, GateDecision};
