//! Role landing pages.
//!
//! The gate only lets a principal reach the area its role owns, so these
//! handlers just report who is signed in.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Json},
};

use super::auth::{Principal, types::SessionResponse};

#[utoipa::path(
    get,
    path = "/super-admin/dashboard",
    responses(
        (status = 200, description = "Super admin landing page", body = SessionResponse),
        (status = 303, description = "No session or not a super admin")
    ),
    tag = "dashboard"
)]
pub async fn super_admin(principal: Option<Extension<Principal>>) -> impl IntoResponse {
    summary(principal)
}

#[utoipa::path(
    get,
    path = "/admin/{store_id}/dashboard",
    params(
        ("store_id" = String, Path, description = "Store managed by the admin")
    ),
    responses(
        (status = 200, description = "Store admin landing page", body = SessionResponse),
        (status = 303, description = "No session or another store")
    ),
    tag = "dashboard"
)]
pub async fn store_admin(
    Path(_store_id): Path<String>,
    principal: Option<Extension<Principal>>,
) -> impl IntoResponse {
    summary(principal)
}

fn summary(principal: Option<Extension<Principal>>) -> impl IntoResponse {
    match principal {
        Some(Extension(principal)) => {
            (StatusCode::OK, Json(SessionResponse::from(&principal))).into_response()
        }
        // Only reachable when mounted without the gate.
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}
