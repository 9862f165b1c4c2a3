//! Route classification and role landing paths.

use super::principal::{Principal, Role};

pub const LOGIN_PATH: &str = "/login";
pub const SUPER_ADMIN_HOME: &str = "/super-admin/dashboard";

const SUPER_ADMIN_PREFIX: &str = "/super-admin";
const ADMIN_PREFIX: &str = "/admin";

/// Exact public paths.
const PUBLIC_PATHS: [&str; 5] = ["/", "/test", LOGIN_PATH, "/logout", "/health"];

/// Public path prefixes, matched per segment (`/auth` and `/auth/...`).
const PUBLIC_PREFIXES: [&str; 1] = ["/auth"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Protected,
}

/// The role/store combination has no landing path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessMisconfigured;

/// Drop trailing slashes so `/login/` and `/login` classify the same.
fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

fn under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[must_use]
pub fn classify(path: &str) -> RouteClass {
    let path = normalize(path);
    if PUBLIC_PATHS.contains(&path) || PUBLIC_PREFIXES.iter().any(|prefix| under(path, prefix)) {
        RouteClass::Public
    } else {
        RouteClass::Protected
    }
}

#[must_use]
pub fn is_login_path(path: &str) -> bool {
    normalize(path) == LOGIN_PATH
}

/// A store id is usable in a path only as one plain segment.
fn valid_store_segment(store_id: &str) -> bool {
    !store_id.is_empty()
        && store_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Landing path for a role.
///
/// # Errors
/// [`AccessMisconfigured`] for plain users and for admins without a usable store.
pub fn target_for_role(role: Role, store_id: Option<&str>) -> Result<String, AccessMisconfigured> {
    match (role, store_id) {
        (Role::SuperAdmin, _) => Ok(SUPER_ADMIN_HOME.to_string()),
        (Role::Admin, Some(store)) if valid_store_segment(store) => {
            Ok(format!("{ADMIN_PREFIX}/{store}/dashboard"))
        }
        (Role::Admin, _) | (Role::User, _) => Err(AccessMisconfigured),
    }
}

/// Whether `path` lies inside the area the principal's role owns.
#[must_use]
pub fn owns_path(principal: &Principal, path: &str) -> bool {
    let path = normalize(path);
    match principal.role {
        Role::SuperAdmin => under(path, SUPER_ADMIN_PREFIX),
        Role::Admin => principal
            .store_id
            .as_deref()
            .filter(|store| valid_store_segment(store))
            .is_some_and(|store| under(path, &format!("{ADMIN_PREFIX}/{store}"))),
        Role::User => false,
    }
}
