//! Small helpers for login input validation.

use regex::Regex;

use super::types::{FieldErrors, LoginRequest};

pub(super) const MIN_PASSWORD_LENGTH: usize = 6;

/// Normalize an email before it is sent to the auth provider.
pub(super) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(super) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Field-level checks run before any remote call.
pub(super) fn validate_login(request: &LoginRequest) -> FieldErrors {
    let email = normalize_email(&request.email);
    let email_error = if email.is_empty() {
        Some("Please enter your email")
    } else if !valid_email(&email) {
        Some("Please enter a valid email")
    } else {
        None
    };

    let password_error = if request.password.trim().is_empty() {
        Some("Please enter your password")
    } else if request.password.chars().count() < MIN_PASSWORD_LENGTH {
        Some("Password must be at least 6 characters")
    } else {
        None
    };

    FieldErrors {
        email: email_error.map(str::to_string),
        password: password_error.map(str::to_string),
    }
}
