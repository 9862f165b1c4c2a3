use crate::{GIT_COMMIT_HASH, api::handlers::auth::Principal};
use axum::{extract::Extension, response::IntoResponse, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::auth::Role;

// axum handler for /
pub async fn root() -> impl IntoResponse {
    concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Diagnostics {
    name: String,
    version: String,
    build: String,
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
}

#[utoipa::path(
    get,
    path = "/test",
    responses(
        (status = 200, description = "Build and session diagnostics", body = Diagnostics)
    ),
    tag = "health"
)]
pub async fn diagnostics(principal: Option<Extension<Principal>>) -> impl IntoResponse {
    Json(Diagnostics {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        build: GIT_COMMIT_HASH.to_string(),
        authenticated: principal.is_some(),
        role: principal.map(|Extension(principal)| principal.role),
    })
}
