use crate::{
    api::handlers::{
        auth::{self, AuthConfig, AuthState},
        root,
    },
    backend::{Backend, GoTrueClient, PgProfileStore},
    cli::globals::GlobalArgs,
};
use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::get,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, info, info_span, warn};
use ulid::Ulid;
use utoipa_axum::router::OpenApiRouter;

pub mod handlers;
// OpenAPI router wiring and route registration live in openapi.rs.
mod openapi;

pub use openapi::openapi;

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Assemble the full application: documented routes, the session gate and the
/// shared state every handler reads through extensions.
pub fn app(backend: Backend, auth_state: Arc<AuthState>) -> Router {
    let (router, _openapi) = router().split_for_parts();
    router
        .route("/", get(root::root))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(auth_state))
                .layer(Extension(backend))
                // Innermost: runs after the extensions above are in place.
                .layer(middleware::from_fn(auth::gate)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(
    port: u16,
    dsn: String,
    globals: &GlobalArgs,
    auth_config: AuthConfig,
) -> Result<()> {
    let timeout = Duration::from_secs(globals.backend_timeout_seconds);

    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .acquire_timeout(timeout)
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let auth_provider = GoTrueClient::new(
        &globals.backend_url,
        globals.backend_anon_key.clone(),
        timeout,
    )?;

    let backend = Backend::new(
        Arc::new(auth_provider),
        Arc::new(PgProfileStore::new(pool, timeout)),
    );

    if let Err(err) = backend.auth().ping().await {
        warn!("Auth provider is not reachable yet: {err}");
    }

    let auth_state = Arc::new(AuthState::new(auth_config));
    let app = app(backend, auth_state);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::test_support::{
        FakeAuth, FakeProfiles, FixedClock, access_cookie, profile_row,
    };
    use crate::backend::AuthUser;
    use axum::{
        body::to_bytes,
        http::{
            Method, StatusCode,
            header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        },
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    const NOW: i64 = 1_700_000_000;

    fn test_app(auth: FakeAuth, profiles: FakeProfiles) -> Router {
        let state = AuthState::with_clock(AuthConfig::default(), Arc::new(FixedClock(NOW)));
        app(
            Backend::new(Arc::new(auth), Arc::new(profiles)),
            Arc::new(state),
        )
    }

    fn signed_in(role: &str, store: Option<&str>, issued_ago: i64) -> Router {
        let id = Uuid::new_v4();
        let auth = FakeAuth::default().with_token(
            "tok",
            AuthUser {
                id,
                email: "a@example.com".to_string(),
                issued_at: Some(NOW - issued_ago),
            },
        );
        test_app(auth, FakeProfiles::with(vec![profile_row(id, Some(role), store)]))
    }

    fn get_with_cookie(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(COOKIE, access_cookie("tok"))
            .body(Body::empty())
            .unwrap()
    }

    fn location(response: &axum::response::Response) -> Option<&str> {
        response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
    }

    #[tokio::test]
    async fn anonymous_root_and_request_id() {
        let response = test_app(FakeAuth::default(), FakeProfiles::with(Vec::new()))
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn anonymous_dashboard_redirects_to_login() {
        let response = test_app(FakeAuth::default(), FakeProfiles::with(Vec::new()))
            .oneshot(
                Request::builder()
                    .uri("/super-admin/dashboard")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/login"));
    }

    #[tokio::test]
    async fn unknown_protected_path_is_gated() {
        let response = test_app(FakeAuth::default(), FakeProfiles::with(Vec::new()))
            .oneshot(Request::builder().uri("/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(location(&response), Some("/login"));
    }

    #[tokio::test]
    async fn super_admin_reaches_dashboard() {
        let response = signed_in("super_admin", None, 10)
            .oneshot(get_with_cookie("/super-admin/dashboard"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["role"], "super_admin");
    }

    #[tokio::test]
    async fn super_admin_is_sent_home_from_store_area() {
        let response = signed_in("super_admin", None, 10)
            .oneshot(get_with_cookie("/admin/xyz/dashboard"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/super-admin/dashboard"));
    }

    #[tokio::test]
    async fn admin_is_kept_in_own_store() {
        let app = signed_in("admin", Some("S1"), 10);
        let response = app
            .clone()
            .oneshot(get_with_cookie("/admin/S2/dashboard"))
            .await
            .unwrap();
        assert_eq!(location(&response), Some("/admin/S1/dashboard"));

        let response = app
            .oneshot(get_with_cookie("/admin/S1/dashboard"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn plain_user_is_forbidden() {
        let response = signed_in("user", None, 10)
            .oneshot(get_with_cookie("/super-admin/dashboard"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(LOCATION).is_none());
    }

    #[tokio::test]
    async fn plain_user_sees_notice_on_login() {
        let response = signed_in("user", None, 10)
            .oneshot(get_with_cookie("/login"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(value["error"].is_string());
    }

    #[tokio::test]
    async fn expired_session_clears_cookies_and_redirects() {
        let response = signed_in("admin", Some("S1"), 301)
            .oneshot(get_with_cookie("/admin/S1/dashboard"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/login"));
        let cleared: Vec<_> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter(|value| value.contains("Max-Age=0"))
            .collect();
        assert_eq!(cleared.len(), 2);
    }

    #[tokio::test]
    async fn expired_session_on_login_renders_page() {
        let response = signed_in("admin", Some("S1"), 301)
            .oneshot(get_with_cookie("/login"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get_all(SET_COOKIE).iter().count(), 2);
    }

    #[tokio::test]
    async fn signed_in_login_redirects_home() {
        let response = signed_in("admin", Some("S1"), 10)
            .oneshot(get_with_cookie("/login"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/admin/S1/dashboard"));
    }

    #[tokio::test]
    async fn session_endpoint_reports_state() {
        let response = signed_in("admin", Some("S1"), 10)
            .oneshot(get_with_cookie("/auth/session"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = test_app(FakeAuth::default(), FakeProfiles::with(Vec::new()))
            .oneshot(
                Request::builder()
                    .uri("/auth/session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn logout_clears_cookies() {
        let response = signed_in("admin", Some("S1"), 10)
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/logout")
                    .header(COOKIE, access_cookie("tok"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/login"));
        assert_eq!(response.headers().get_all(SET_COOKIE).iter().count(), 2);
    }

    #[tokio::test]
    async fn login_post_sets_cookies() {
        let id = Uuid::new_v4();
        let auth = FakeAuth::default().with_account(
            "secret1",
            "fresh",
            AuthUser {
                id,
                email: "admin@store.com".to_string(),
                issued_at: Some(NOW),
            },
        );
        let app = test_app(
            auth,
            FakeProfiles::with(vec![profile_row(id, Some("admin"), Some("S1"))]),
        );
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/login")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"email":"admin@store.com","password":"secret1"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/admin/S1/dashboard"));
        assert_eq!(response.headers().get_all(SET_COOKIE).iter().count(), 2);
    }

    #[tokio::test]
    async fn login_over_expired_cookie_keeps_new_session() {
        let id = Uuid::new_v4();
        let user = AuthUser {
            id,
            email: "admin@store.com".to_string(),
            issued_at: Some(NOW - 400),
        };
        let auth = FakeAuth::default()
            .with_token("stale", user.clone())
            .with_account(
                "secret1",
                "fresh",
                AuthUser {
                    issued_at: Some(NOW),
                    ..user
                },
            );
        let app = test_app(
            auth,
            FakeProfiles::with(vec![profile_row(id, Some("admin"), Some("S1"))]),
        );
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/login")
                    .header(CONTENT_TYPE, "application/json")
                    .header(COOKIE, access_cookie("stale"))
                    .body(Body::from(
                        r#"{"email":"admin@store.com","password":"secret1"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/admin/S1/dashboard"));

        let access: Vec<_> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter(|value| value.starts_with("sb-access-token="))
            .collect();
        assert_eq!(access.len(), 1);
        assert!(access[0].starts_with("sb-access-token=fresh;"));
        assert!(access[0].contains("Max-Age=300"));
    }

    #[tokio::test]
    async fn expired_cookie_failed_login_still_clears() {
        let id = Uuid::new_v4();
        let auth = FakeAuth::default().with_token(
            "stale",
            AuthUser {
                id,
                email: "admin@store.com".to_string(),
                issued_at: Some(NOW - 400),
            },
        );
        let response = test_app(auth, FakeProfiles::with(Vec::new()))
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/login")
                    .header(CONTENT_TYPE, "application/json")
                    .header(COOKIE, access_cookie("stale"))
                    .body(Body::from(
                        r#"{"email":"admin@store.com","password":"wrong-1"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let deletions = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter(|value| value.contains("Max-Age=0"))
            .count();
        assert_eq!(deletions, 2);
    }

    #[tokio::test]
    async fn rejected_token_is_cleared() {
        let response = test_app(FakeAuth::default(), FakeProfiles::with(Vec::new()))
            .oneshot(get_with_cookie("/admin/S1/dashboard"))
            .await
            .unwrap();
        assert_eq!(location(&response), Some("/login"));
        assert_eq!(response.headers().get_all(SET_COOKIE).iter().count(), 2);
    }
}
