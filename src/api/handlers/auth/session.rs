//! Session cookies and the session/logout endpoints.

use axum::{
    Json,
    extract::Extension,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{COOKIE, InvalidHeaderValue, SET_COOKIE},
    },
    response::{IntoResponse, Redirect, Response},
};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::{error, warn};

use super::{
    principal::Principal,
    routes::LOGIN_PATH,
    state::{AuthConfig, AuthState},
    types::SessionResponse,
};
use crate::backend::{Backend, TokenPair};

pub const ACCESS_COOKIE_NAME: &str = "sb-access-token";
pub const REFRESH_COOKIE_NAME: &str = "sb-refresh-token";

#[utoipa::path(
    get,
    path = "/auth/session",
    responses(
        (status = 200, description = "Session is active", body = SessionResponse),
        (status = 204, description = "No active session")
    ),
    tag = "auth"
)]
pub async fn session(principal: Option<Extension<Principal>>) -> impl IntoResponse {
    // The gate already resolved the cookie; absence means "no session".
    match principal {
        Some(Extension(principal)) => {
            (StatusCode::OK, Json(SessionResponse::from(&principal))).into_response()
        }
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 303, description = "Session cleared, redirect to login")
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    backend: Extension<Backend>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    if let Some(token) = access_token(&headers)
        && let Err(err) = backend.auth().sign_out(&token).await
    {
        warn!("Failed to sign out at auth provider: {err}");
    }

    // Always clear the cookies, even if the remote sign-out failed.
    let mut response = Redirect::to(LOGIN_PATH).into_response();
    append_cleared_cookies(&mut response, auth_state.config());
    response
}

fn cookie(
    config: &AuthConfig,
    name: &str,
    value: &str,
    max_age: i64,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Build the access/refresh cookie pair; both live exactly one session timeout.
pub(super) fn session_cookies(
    config: &AuthConfig,
    tokens: &TokenPair,
) -> Result<[HeaderValue; 2], InvalidHeaderValue> {
    let max_age = config.session_timeout_seconds();
    Ok([
        cookie(
            config,
            ACCESS_COOKIE_NAME,
            tokens.access_token.expose_secret(),
            max_age,
        )?,
        cookie(
            config,
            REFRESH_COOKIE_NAME,
            tokens.refresh_token.expose_secret(),
            max_age,
        )?,
    ])
}

pub(super) fn cleared_cookies(config: &AuthConfig) -> Result<[HeaderValue; 2], InvalidHeaderValue> {
    Ok([
        cookie(config, ACCESS_COOKIE_NAME, "", 0)?,
        cookie(config, REFRESH_COOKIE_NAME, "", 0)?,
    ])
}

/// Append deletions for both session cookies to `response`.
pub(super) fn append_cleared_cookies(response: &mut Response, config: &AuthConfig) {
    match cleared_cookies(config) {
        Ok(cookies) => {
            for value in cookies {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
        Err(err) => error!("Failed to build session cookie deletion: {err}"),
    }
}

/// Whether `response` already issues a new access cookie.
pub(super) fn issues_session(response: &Response) -> bool {
    let prefix = format!("{ACCESS_COOKIE_NAME}=");
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.strip_prefix(prefix.as_str()))
        .any(|rest| !rest.is_empty() && !rest.starts_with(';'))
}

pub(crate) fn access_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, ACCESS_COOKIE_NAME)
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (key, val) = pair.trim().split_once('=')?;
            (key.trim() == name).then(|| val.trim().to_string())
        })
        .find(|val| !val.is_empty())
}
