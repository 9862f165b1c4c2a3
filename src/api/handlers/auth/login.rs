//! Login page and password sign-in.

use axum::{
    Json,
    extract::Extension,
    http::{StatusCode, header::LOCATION, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use super::{
    errors::{ACCESS_MISCONFIGURED, LoginError, login_error_response},
    gate::MisconfiguredAccess,
    principal::resolve_role,
    routes::target_for_role,
    session::session_cookies,
    state::AuthState,
    types::{ErrorResponse, LoginPageResponse, LoginRequest, LoginResponse},
    utils::{normalize_email, validate_login},
};
use crate::backend::{Backend, SignIn, TokenPair};

#[utoipa::path(
    get,
    path = "/login",
    responses(
        (status = 200, description = "Login page state", body = LoginPageResponse),
        (status = 303, description = "Already signed in, redirect to role home")
    ),
    tag = "auth"
)]
pub async fn login_page(notice: Option<Extension<MisconfiguredAccess>>) -> impl IntoResponse {
    let error = notice.map(|_| ACCESS_MISCONFIGURED.to_string());
    (StatusCode::OK, Json(LoginPageResponse { error }))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 303, description = "Signed in, redirect to role home", body = LoginResponse),
        (status = 401, description = "Credentials rejected", body = ErrorResponse),
        (status = 403, description = "Profile missing, inactive or without access", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 503, description = "Auth provider or profile store unavailable", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    backend: Extension<Backend>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request = payload.map(|Json(request)| request).unwrap_or_default();

    match sign_in(&backend, &auth_state, request).await {
        Ok(response) => response,
        Err(err) => {
            let (status, body) = login_error_response(err);
            (status, Json(body)).into_response()
        }
    }
}

#[instrument(skip_all)]
async fn sign_in(
    backend: &Backend,
    auth_state: &AuthState,
    request: LoginRequest,
) -> Result<Response, LoginError> {
    let fields = validate_login(&request);
    if !fields.is_empty() {
        return Err(LoginError::Validation(fields));
    }

    let email = normalize_email(&request.email);
    let password = SecretString::from(request.password);

    let SignIn { user, tokens } = backend
        .auth()
        .sign_in_with_password(&email, &password)
        .await
        .map_err(|err| {
            debug!("Sign-in rejected: {err}");
            LoginError::Credentials(err)
        })?;

    if user.issued_at.is_none() {
        warn!(user_id = %user.id, "Access token carries no iat claim; session will not validate");
    }

    let profile = match resolve_role(backend.profiles(), user.id).await {
        Ok(profile) => profile,
        Err(err) => {
            discard_session(backend, &tokens).await;
            return Err(LoginError::Profile(err));
        }
    };

    let Ok(target) = target_for_role(profile.role, profile.store_id.as_deref()) else {
        discard_session(backend, &tokens).await;
        return Err(LoginError::AccessMisconfigured(profile.role));
    };

    let cookies = session_cookies(auth_state.config(), &tokens).map_err(|err| {
        error!("Failed to build session cookies: {err}");
        LoginError::Internal
    })?;

    info!(user_id = %user.id, role = %profile.role, "Signed in");

    let mut response = (
        StatusCode::SEE_OTHER,
        [(LOCATION, target.clone())],
        Json(LoginResponse { redirect_to: target }),
    )
        .into_response();
    for cookie in cookies {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    Ok(response)
}

/// Best-effort provider sign-out for tokens that will never reach a cookie.
async fn discard_session(backend: &Backend, tokens: &TokenPair) {
    if let Err(err) = backend
        .auth()
        .sign_out(tokens.access_token.expose_secret())
        .await
    {
        warn!("Failed to discard provider session: {err}");
    }
}
