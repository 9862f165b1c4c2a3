//! User-facing failure messages at the login boundary and the gate.

use axum::http::StatusCode;

use super::{
    principal::{ResolveError, Role},
    types::{ErrorResponse, FieldErrors},
};
use crate::backend::AuthError;

pub(crate) const INVALID_CREDENTIALS: &str = "Invalid email or password.";
pub(crate) const EMAIL_NOT_CONFIRMED: &str = "Please confirm your email before signing in.";
pub(crate) const SIGN_IN_UNAVAILABLE: &str = "Unable to sign in. Please try again later.";
pub(crate) const PROFILE_NOT_FOUND: &str = "User not found.";
pub(crate) const PROFILE_INACTIVE: &str = "Your account is disabled. Contact the administrator.";
pub(crate) const NO_ACCESS_PERMISSION: &str =
    "User has no access permission. Contact the administrator.";
pub(crate) const ACCESS_MISCONFIGURED: &str =
    "Access configuration is incomplete. Contact the administrator.";
const INVALID_INPUT: &str = "Please correct the highlighted fields.";

#[derive(Debug)]
pub(super) enum LoginError {
    Validation(FieldErrors),
    Credentials(AuthError),
    Profile(ResolveError),
    AccessMisconfigured(Role),
    Internal,
}

pub(super) fn login_error_response(err: LoginError) -> (StatusCode, ErrorResponse) {
    match err {
        LoginError::Validation(fields) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorResponse {
                error: INVALID_INPUT.to_string(),
                fields: Some(fields),
            },
        ),
        LoginError::Credentials(AuthError::InvalidCredentials) => (
            StatusCode::UNAUTHORIZED,
            ErrorResponse::message(INVALID_CREDENTIALS),
        ),
        LoginError::Credentials(AuthError::EmailNotConfirmed) => (
            StatusCode::UNAUTHORIZED,
            ErrorResponse::message(EMAIL_NOT_CONFIRMED),
        ),
        LoginError::Credentials(AuthError::Rejected(_)) => (
            StatusCode::UNAUTHORIZED,
            ErrorResponse::message(SIGN_IN_UNAVAILABLE),
        ),
        LoginError::Credentials(AuthError::Backend(_))
        | LoginError::Profile(ResolveError::Remote(_)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorResponse::message(SIGN_IN_UNAVAILABLE),
        ),
        LoginError::Profile(ResolveError::NotFound) => (
            StatusCode::FORBIDDEN,
            ErrorResponse::message(PROFILE_NOT_FOUND),
        ),
        LoginError::Profile(ResolveError::Inactive) => (
            StatusCode::FORBIDDEN,
            ErrorResponse::message(PROFILE_INACTIVE),
        ),
        LoginError::AccessMisconfigured(Role::User) => (
            StatusCode::FORBIDDEN,
            ErrorResponse::message(NO_ACCESS_PERMISSION),
        ),
        LoginError::AccessMisconfigured(Role::Admin | Role::SuperAdmin) => (
            StatusCode::FORBIDDEN,
            ErrorResponse::message(ACCESS_MISCONFIGURED),
        ),
        LoginError::Internal => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::message(SIGN_IN_UNAVAILABLE),
        ),
    }
}
