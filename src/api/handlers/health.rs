use crate::{GIT_COMMIT_HASH, backend::Backend};
use axum::{
    extract::Extension,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    database: String,
    auth_provider: String,
}

fn status_str(healthy: bool) -> String {
    if healthy { "ok" } else { "error" }.to_string()
}

#[utoipa::path(
    get,
    path= "/health",
    responses (
        (status = 200, description = "Database and auth provider are reachable", body = [Health]),
        (status = 503, description = "Database or auth provider is unreachable", body = [Health])
    ),
    tag= "health"
)]
// axum handler for health
pub async fn health(backend: Extension<Backend>) -> impl IntoResponse {
    let (database, auth_provider) =
        tokio::join!(backend.profiles().ping(), backend.auth().ping());

    if let Err(err) = &database {
        warn!("Database health check failed: {err}");
    }
    if let Err(err) = &auth_provider {
        warn!("Auth provider health check failed: {err}");
    }

    let is_healthy = database.is_ok() && auth_provider.is_ok();

    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: status_str(database.is_ok()),
        auth_provider: status_str(auth_provider.is_ok()),
    };

    let short_hash = if health.commit.len() > 7 {
        &health.commit[0..7]
    } else {
        ""
    };

    let headers = format!("{}:{}:{}", health.name, health.version, short_hash)
        .parse::<HeaderValue>()
        .map(|x_app_header_value| {
            debug!("X-App header: {:?}", x_app_header_value);

            let mut headers = HeaderMap::new();

            headers.insert("X-App", x_app_header_value);

            headers
        })
        .map_err(|err| {
            error!("Failed to parse X-App header: {}", err);
        });

    let headers = headers.unwrap_or_else(|()| HeaderMap::new());

    if is_healthy {
        (StatusCode::OK, headers, Json(health))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, headers, Json(health))
    }
}
