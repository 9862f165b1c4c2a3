//! Role resolution and the authenticated principal.
//!
//! Flow Overview: the gate turns a verified auth-provider user into a
//! [`UserProfile`] via one read of the `users` table, then forwards a
//! [`Principal`] to downstream handlers through request extensions.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::{debug, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::backend::{BackendError, ProfileRow, ProfileStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    User,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    /// Decode a stored role; missing or unknown values are the least
    /// privileged role.
    #[must_use]
    pub fn from_column(value: Option<&str>) -> Self {
        value
            .and_then(|role| role.parse().ok())
            .unwrap_or(Self::User)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub store_id: Option<String>,
    pub active: bool,
}

impl From<ProfileRow> for UserProfile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            name: row.name,
            role: Role::from_column(row.role.as_deref()),
            store_id: row.store_id.filter(|store| !store.trim().is_empty()),
            active: row.active,
        }
    }
}

/// Authenticated user context forwarded by the gate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub store_id: Option<String>,
}

impl From<UserProfile> for Principal {
    fn from(profile: UserProfile) -> Self {
        Self {
            user_id: profile.id,
            email: profile.email,
            name: profile.name,
            role: profile.role,
            store_id: profile.store_id,
        }
    }
}

#[derive(Debug)]
pub enum ResolveError {
    NotFound,
    Inactive,
    Remote(BackendError),
}

/// Look up the profile for `user_id`.
///
/// # Errors
/// `NotFound` when no row matches, `Inactive` when the row is disabled and
/// `Remote` when the store could not be read. Callers treat all three as "no
/// valid session".
#[instrument(skip(store))]
pub async fn resolve_role(
    store: &dyn ProfileStore,
    user_id: Uuid,
) -> Result<UserProfile, ResolveError> {
    match store.fetch_profile(user_id).await {
        Ok(Some(row)) => {
            let profile = UserProfile::from(row);
            if profile.active {
                Ok(profile)
            } else {
                debug!("Profile is inactive");
                Err(ResolveError::Inactive)
            }
        }
        Ok(None) => {
            debug!("No profile row for user");
            Err(ResolveError::NotFound)
        }
        Err(err) => {
            warn!("Failed to read profile: {err}");
            Err(ResolveError::Remote(err))
        }
    }
}
