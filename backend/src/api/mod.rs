//! Central module for organizing the application's HTTP surface.
//!
//! Each domain contributes a router; [`create_router`] merges them and wraps
//! the result in the middleware stack. Requests pass through, in order:
//! tracing, CORS (when enabled), session resolution, the request gate and
//! finally the handler.

pub mod admin;
pub mod applications;
pub mod extract;
pub mod mailing_list;
pub mod pages;
pub mod teams;
pub mod user;

use axum::{middleware::from_fn_with_state, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{auth_router, resolve_session};
use crate::middleware::request_gate;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(pages::routes::pages_router())
        .merge(auth_router())
        .merge(user::routes::user_router())
        .merge(applications::routes::applications_router())
        .merge(teams::routes::teams_router())
        .merge(mailing_list::routes::mailing_list_router())
        .merge(admin::routes::admin_router())
        // Layers run bottom-up: the session must exist before the gate looks at it.
        .layer(from_fn_with_state(state.clone(), request_gate))
        .layer(from_fn_with_state(state.clone(), resolve_session));

    if state.config.server.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, ApplicationCycle, IdentityConfig, MerchConfig};
    use crate::database::models::ApplicationStatus;
    use crate::database::testing::UnreachableStore;
    use crate::database::{ApplicationStore, InMemoryStore, Store};
    use crate::utils::FixedClock;
    use adapters::{
        Claims, IdentityProvider, Role, SignedTokenProvider, TokenIssuer, TrustedHeaderProvider,
    };
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, Response, StatusCode};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    const SECRET: &str = "0101010101010101010101010101010101010101010101010101010101010101";

    fn open_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 17, 0, 0).unwrap()
    }

    fn before_open() -> DateTime<Utc> {
        open_at() - Duration::hours(1)
    }

    fn after_open() -> DateTime<Utc> {
        open_at() + Duration::hours(1)
    }

    fn config(cycle: ApplicationCycle) -> AppConfig {
        let mut config = AppConfig::default();
        config.gate.open_at = open_at();
        config.cycle = cycle;
        config
    }

    struct Harness {
        app: Router,
        store: Arc<InMemoryStore>,
    }

    fn harness_with(config: AppConfig, now: DateTime<Utc>) -> Harness {
        let store = Arc::new(InMemoryStore::new());
        let state = AppState::new(
            config,
            store.clone(),
            Arc::new(TrustedHeaderProvider::default()),
            Arc::new(FixedClock(now)),
        );
        Harness {
            app: create_router(state),
            store,
        }
    }

    fn harness(cycle: ApplicationCycle, now: DateTime<Utc>) -> Harness {
        harness_with(config(cycle), now)
    }

    fn request(method: &str, uri: &str, caller: Option<(&str, &str)>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((user, role)) = caller {
            builder = builder.header("x-user-id", user).header("x-user-role", role);
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn applicant(user: &str) -> Option<(&str, &str)> {
        Some((user, "applicant"))
    }

    fn admin() -> Option<(&'static str, &'static str)> {
        Some(("root", "admin"))
    }

    async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn location(response: &Response<Body>) -> Option<&str> {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
    }

    fn profile() -> Value {
        json!({ "first_name": "Ada", "last_name": "Lovelace", "email": "ada@example.org" })
    }

    fn answers() -> Value {
        json!({
            "school": "State University",
            "major": "Computer Science",
            "graduation_year": 2027,
            "experience": "intermediate",
            "shirt_size": "m",
            "motivation": "Build something with friends"
        })
    }

    async fn apply(app: &Router, user: &str) -> Value {
        let response = send(app, request("PUT", "/api/user", applicant(user), Some(profile()))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = send(
            app,
            request("POST", "/api/applications", applicant(user), Some(answers())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await
    }

    #[tokio::test]
    async fn gated_paths_redirect_before_open() {
        let harness = harness(ApplicationCycle::Open, before_open());

        for path in ["/dashboard", "/apply", "/status", "/dashboard/anything?x=1"] {
            let response = send(&harness.app, request("GET", path, applicant("u1"), None)).await;
            assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
            assert_eq!(location(&response), Some("/applications-closed"), "{path}");
        }

        let response = send(
            &harness.app,
            request("POST", "/api/applications", applicant("u1"), Some(answers())),
        )
        .await;
        assert_eq!(location(&response), Some("/applications-closed"));

        for path in ["/", "/sign-in", "/applications-closed", "/merch", "/dashboards"] {
            let response = send(&harness.app, request("GET", path, None, None)).await;
            assert_ne!(location(&response), Some("/applications-closed"), "{path}");
        }
    }

    #[tokio::test]
    async fn admin_bypasses_gate_only_inside_admin_subtree() {
        let harness = harness(ApplicationCycle::Open, before_open());

        let response = send(&harness.app, request("GET", "/dashboard/admin/stats", admin(), None)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&harness.app, request("GET", "/dashboard/admin", admin(), None)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&harness.app, request("GET", "/status", admin(), None)).await;
        assert_eq!(location(&response), Some("/applications-closed"));

        let response = send(
            &harness.app,
            request("GET", "/dashboard/admin/stats", applicant("u1"), None),
        )
        .await;
        assert_eq!(location(&response), Some("/applications-closed"));
    }

    #[tokio::test]
    async fn unknown_role_is_treated_as_anonymous() {
        let before = harness(ApplicationCycle::Open, before_open());
        let response = send(
            &before.app,
            request("GET", "/dashboard/admin", Some(("root", "superadmin")), None),
        )
        .await;
        assert_eq!(location(&response), Some("/applications-closed"));

        let after = harness(ApplicationCycle::Open, after_open());
        let response = send(
            &after.app,
            request("GET", "/dashboard/admin", Some(("root", "superadmin")), None),
        )
        .await;
        assert_eq!(location(&response), Some("/sign-in"));
    }

    #[tokio::test]
    async fn admin_pages_require_admin_role() {
        let harness = harness(ApplicationCycle::Open, after_open());

        let response = send(&harness.app, request("GET", "/dashboard/admin", None, None)).await;
        assert_eq!(location(&response), Some("/sign-in"));

        let response = send(
            &harness.app,
            request("GET", "/dashboard/admin/stats", applicant("u1"), None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn dashboard_redirects_follow_application_state() {
        let harness = harness(ApplicationCycle::Open, after_open());

        let response = send(&harness.app, request("GET", "/dashboard", None, None)).await;
        assert_eq!(location(&response), Some("/sign-in"));

        let response = send(&harness.app, request("GET", "/dashboard", applicant("u1"), None)).await;
        assert_eq!(location(&response), Some("/apply"));

        let response = send(&harness.app, request("GET", "/apply", applicant("u1"), None)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let application = apply(&harness.app, "u1").await;
        assert_eq!(application["status"], "pending");

        let response = send(&harness.app, request("GET", "/dashboard", applicant("u1"), None)).await;
        assert_eq!(location(&response), Some("/status"));
        let response = send(&harness.app, request("GET", "/apply", applicant("u1"), None)).await;
        assert_eq!(location(&response), Some("/status"));

        let response = send(&harness.app, request("GET", "/status", applicant("u1"), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["application"]["status"], "pending");

        let id = application["id"].as_str().unwrap().parse().unwrap();
        harness
            .store
            .set_application_status(id, ApplicationStatus::Accepted)
            .await
            .unwrap();

        let response = send(&harness.app, request("GET", "/dashboard", applicant("u1"), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["application"]["status"], "accepted");
        assert_eq!(body["profile"]["email"], "ada@example.org");

        let response = send(&harness.app, request("GET", "/status", applicant("u1"), None)).await;
        assert_eq!(location(&response), Some("/dashboard"));
    }

    #[tokio::test]
    async fn closed_cycle_sends_new_applicants_to_closed_page() {
        let harness = harness(ApplicationCycle::Closed, after_open());

        let response = send(&harness.app, request("GET", "/dashboard", applicant("u1"), None)).await;
        assert_eq!(location(&response), Some("/applications-closed"));

        send(&harness.app, request("PUT", "/api/user", applicant("u1"), Some(profile()))).await;
        let response = send(
            &harness.app,
            request("POST", "/api/applications", applicant("u1"), Some(answers())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn store_failure_is_a_server_error_not_a_redirect() {
        let store: Arc<dyn Store> = Arc::new(UnreachableStore);
        let state = AppState::new(
            config(ApplicationCycle::Open),
            store,
            Arc::new(TrustedHeaderProvider::default()),
            Arc::new(FixedClock(after_open())),
        );
        let app = create_router(state);

        for path in ["/dashboard", "/apply", "/status"] {
            let response = send(&app, request("GET", path, applicant("u1"), None)).await;
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{path}");
            assert_eq!(location(&response), None, "{path}");
            let body = json_body(response).await;
            assert_eq!(body["code"], "STORAGE_ERROR");
        }
    }

    #[tokio::test]
    async fn application_submission_rules() {
        let harness = harness(ApplicationCycle::Open, after_open());

        let response = send(
            &harness.app,
            request("POST", "/api/applications", None, Some(answers())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(
            &harness.app,
            request("POST", "/api/applications", applicant("u1"), Some(answers())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        apply(&harness.app, "u1").await;

        let response = send(
            &harness.app,
            request("POST", "/api/applications", applicant("u1"), Some(answers())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = send(
            &harness.app,
            request("GET", "/api/applications/mine", applicant("u1"), None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn teams_are_created_once_per_applicant() {
        let harness = harness(ApplicationCycle::Open, after_open());
        apply(&harness.app, "u1").await;
        apply(&harness.app, "u2").await;

        let response = send(
            &harness.app,
            request("POST", "/api/teams", applicant("u1"), Some(json!({ "name": "Rustaceans" }))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = send(&harness.app, request("GET", "/api/teams/mine", applicant("u1"), None)).await;
        assert_eq!(json_body(response).await["name"], "Rustaceans");

        let response = send(
            &harness.app,
            request("POST", "/api/teams", applicant("u2"), Some(json!({ "name": "rustaceans" }))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = send(&harness.app, request("GET", "/api/teams/mine", applicant("u2"), None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn admin_review_and_status_change() {
        let harness = harness(ApplicationCycle::Open, after_open());
        let first = apply(&harness.app, "u1").await;
        apply(&harness.app, "u2").await;
        let id = first["id"].as_str().unwrap();

        let uri = format!("/dashboard/admin/applications/{id}/status");
        let response = send(
            &harness.app,
            request("POST", &uri, applicant("u1"), Some(json!({ "status": "accepted" }))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(
            &harness.app,
            request("POST", &uri, admin(), Some(json!({ "status": "accepted" }))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let missing = format!("/dashboard/admin/applications/{}/status", uuid::Uuid::new_v4());
        let response = send(
            &harness.app,
            request("POST", &missing, admin(), Some(json!({ "status": "rejected" }))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&harness.app, request("GET", "/dashboard", applicant("u1"), None)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(
            &harness.app,
            request("GET", "/dashboard/admin/applications?status=pending", admin(), None),
        )
        .await;
        let table = json_body(response).await;
        assert_eq!(table["total"], 1);
        assert_eq!(table["rows"][0]["user_id"], "u2");
        assert_eq!(table["rows"][0]["email"], "ada@example.org");

        let response = send(
            &harness.app,
            request("GET", "/dashboard/admin/applications?order=sideways", admin(), None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&harness.app, request("GET", "/dashboard/admin/stats", admin(), None)).await;
        let stats = json_body(response).await;
        assert_eq!(stats["pending"], 1);
        assert_eq!(stats["accepted"], 1);
        assert_eq!(stats["rejected"], 0);
        assert_eq!(stats["total"], 2);
    }

    #[tokio::test]
    async fn malformed_input_gets_json_errors() {
        let harness = harness(ApplicationCycle::Open, after_open());
        let response = send(&harness.app, request("PUT", "/api/user", applicant("u1"), Some(profile()))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let mut form = answers();
        form["shirt_size"] = json!("huge");
        let response = send(
            &harness.app,
            request("POST", "/api/applications", applicant("u1"), Some(form)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["code"], "VALIDATION_ERROR");

        let broken = Request::builder()
            .method("POST")
            .uri("/api/mailing-list")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"email\":"))
            .unwrap();
        let response = send(&harness.app, broken).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "BAD_REQUEST");

        let response = send(
            &harness.app,
            request("GET", "/dashboard/admin/applications?limit=abc", admin(), None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "BAD_REQUEST");

        let response = send(
            &harness.app,
            request(
                "GET",
                &format!("/dashboard/admin/applications?offset={}", u64::MAX),
                admin(),
                None,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "BAD_REQUEST");

        let response = send(
            &harness.app,
            request(
                "POST",
                "/dashboard/admin/applications/not-a-uuid/status",
                admin(),
                Some(json!({ "status": "accepted" })),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn mailing_list_does_not_reveal_subscribers() {
        let harness = harness(ApplicationCycle::Open, after_open());

        let response = send(
            &harness.app,
            request("POST", "/api/mailing-list", None, Some(json!({ "email": " Fan@Example.org " }))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["email"], "fan@example.org");

        for email in ["fan@example.org", "stranger@example.org"] {
            let response = send(
                &harness.app,
                request(
                    "POST",
                    "/api/mailing-list/unsubscribe",
                    None,
                    Some(json!({ "email": email })),
                ),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(json_body(response).await, json!({ "unsubscribed": true }));
        }
    }

    #[tokio::test]
    async fn merch_puzzle_unlocks_on_schedule() {
        let mut config = config(ApplicationCycle::Open);
        config.merch = MerchConfig {
            unlock_at: after_open(),
            prompt: "What has keys but opens no locks?".to_string(),
            answer: "keyboard".to_string(),
            reward_url: "https://example.org/claim".to_string(),
        };

        let locked = harness_with(config.clone(), open_at());
        let response = send(&locked.app, request("GET", "/merch", None, None)).await;
        assert_eq!(json_body(response).await["state"], "locked");
        let response = send(
            &locked.app,
            request("POST", "/merch/solve", None, Some(json!({ "answer": "keyboard" }))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let open = harness_with(config, after_open());
        let response = send(
            &open.app,
            request("POST", "/merch/solve", None, Some(json!({ "answer": "piano" }))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let response = send(
            &open.app,
            request("POST", "/merch/solve", None, Some(json!({ "answer": " Keyboard " }))),
        )
        .await;
        assert_eq!(
            json_body(response).await["reward_url"],
            "https://example.org/claim"
        );
    }

    #[tokio::test]
    async fn signed_token_sessions() {
        let issuer = TokenIssuer::from_secret_hex(SECRET).unwrap();
        let mut config = config(ApplicationCycle::Open);
        config.identity = IdentityConfig::SignedToken {
            issuer_public_key: issuer.public_key_hex(),
            cookie_name: "hp_session".to_string(),
        };
        let identity: Arc<dyn IdentityProvider> = Arc::new(
            SignedTokenProvider::from_hex(&issuer.public_key_hex(), "hp_session").unwrap(),
        );
        let state = AppState::new(
            config,
            Arc::new(InMemoryStore::new()),
            identity,
            Arc::new(FixedClock(before_open())),
        );
        let app = create_router(state);

        let valid = issuer.issue(&Claims::new(
            "root",
            Some(Role::Admin),
            Utc::now().timestamp() + 3600,
        ));
        let response = send(
            &app,
            Request::builder()
                .uri("/auth/session")
                .header(header::COOKIE, format!("hp_session={valid}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        let body = json_body(response).await;
        assert_eq!(body["signed_in"], true);
        assert_eq!(body["role"], "admin");

        let response = send(
            &app,
            Request::builder()
                .uri("/dashboard/admin/stats")
                .header(header::AUTHORIZATION, format!("Bearer {valid}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let expired = issuer.issue(&Claims::new(
            "root",
            Some(Role::Admin),
            Utc::now().timestamp() - 60,
        ));
        let response = send(
            &app,
            Request::builder()
                .uri("/dashboard/admin/stats")
                .header(header::AUTHORIZATION, format!("Bearer {expired}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(location(&response), Some("/applications-closed"));

        let response = send(&app, request("POST", "/auth/sign-out", None, None)).await;
        assert_eq!(location(&response), Some("/"));
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("hp_session=;"));
    }
}
