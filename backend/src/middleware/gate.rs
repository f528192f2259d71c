//! The request gate.
//!
//! Before the opening instant, requests under a gated prefix are sent to the
//! closed page. The only exception is the privileged role inside the
//! privileged prefix. After the opening instant the gate lets everything
//! through. Application state is never consulted here.

use adapters::{Role, Session};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};

use crate::config::GateConfig;
use crate::state::AppState;

/// Everything the gate looks at for one request.
#[derive(Debug, Clone, Copy)]
pub struct GateContext<'a> {
    pub path: &'a str,
    pub now: DateTime<Utc>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Continue,
    Redirect(String),
}

/// Strips query and fragment. `/apply/` and `/apply` compare equal under
/// [`path_matches`], so trailing slashes are left alone.
fn request_path(raw: &str) -> &str {
    raw.split(['?', '#']).next().unwrap_or_default()
}

/// Prefix match on path segments: `/apply` covers `/apply` and `/apply/x`
/// but not `/apply-now`.
pub fn path_matches(path: &str, prefix: &str) -> bool {
    let path = request_path(path);
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

pub fn is_gated(path: &str, config: &GateConfig) -> bool {
    config
        .gated_prefixes
        .iter()
        .any(|prefix| path_matches(path, prefix))
}

/// Whether the caller may pass a closed gate at this path.
pub fn may_bypass(ctx: &GateContext<'_>, config: &GateConfig) -> bool {
    ctx.role == Some(config.privileged_role) && path_matches(ctx.path, &config.privileged_prefix)
}

pub fn evaluate(ctx: &GateContext<'_>, config: &GateConfig) -> GateDecision {
    if ctx.now >= config.open_at {
        return GateDecision::Continue;
    }

    if !is_gated(ctx.path, config) || may_bypass(ctx, config) {
        return GateDecision::Continue;
    }

    GateDecision::Redirect(config.closed_redirect.clone())
}

/// Axum middleware running [`evaluate`] for every request.
///
/// Expects the session resolver to have run first. A request without a
/// session extension is treated as anonymous.
pub async fn request_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let role = request
        .extensions()
        .get::<Session>()
        .and_then(|session| session.role);

    let ctx = GateContext {
        path: request.uri().path(),
        now: state.clock.now(),
        role,
    };

    match evaluate(&ctx, &state.config.gate) {
        GateDecision::Continue => next.run(request).await,
        GateDecision::Redirect(target) => {
            tracing::debug!(path = ctx.path, target = %target, "request gate closed");
            Redirect::temporary(&target).into_response()
        }
    }
}
