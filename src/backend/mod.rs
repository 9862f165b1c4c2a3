//! Remote backend boundary.
//!
//! The hosted platform is two collaborators: an auth provider that exchanges
//! credentials for tokens and resolves tokens back to users, and a relational
//! store that holds user profiles. Both sit behind traits so handlers receive
//! an injected [`Backend`] handle instead of reaching for a global client.

pub mod gotrue;
pub mod postgres;

use async_trait::async_trait;
use secrecy::SecretString;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub use gotrue::GoTrueClient;
pub use postgres::PgProfileStore;

/// Failure talking to a remote collaborator.
#[derive(Clone, Debug, Error)]
pub enum BackendError {
    #[error("remote call timed out")]
    Timeout,
    #[error("remote unavailable: {0}")]
    Unavailable(String),
    #[error("unexpected remote response: {0}")]
    Protocol(String),
}

/// Why a credential exchange did not produce a session.
#[derive(Clone, Debug, Error)]
pub enum AuthError {
    #[error("invalid login credentials")]
    InvalidCredentials,
    #[error("email not confirmed")]
    EmailNotConfirmed,
    #[error("sign-in rejected: {0}")]
    Rejected(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// User identity as reported by the auth provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    /// Unix seconds at which the current access token was issued, when known.
    pub issued_at: Option<i64>,
}

#[derive(Clone)]
pub struct TokenPair {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"***")
            .field("refresh_token", &"***")
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct SignIn {
    pub user: AuthUser,
    pub tokens: TokenPair,
}

/// Raw `users` row. Role decoding happens in the role resolver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Option<String>,
    pub store_id: Option<String>,
    pub active: bool,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchange email/password for a token pair.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SignIn, AuthError>;

    /// Resolve an access token to its user. `Ok(None)` means the provider
    /// rejected the token.
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, BackendError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError>;

    async fn ping(&self) -> Result<(), BackendError>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<ProfileRow>, BackendError>;

    async fn ping(&self) -> Result<(), BackendError>;
}

/// Request-scoped handle to the remote collaborators.
#[derive(Clone)]
pub struct Backend {
    auth: Arc<dyn AuthProvider>,
    profiles: Arc<dyn ProfileStore>,
}

impl Backend {
    #[must_use]
    pub fn new(auth: Arc<dyn AuthProvider>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self { auth, profiles }
    }

    #[must_use]
    pub fn auth(&self) -> &dyn AuthProvider {
        self.auth.as_ref()
    }

    #[must_use]
    pub fn profiles(&self) -> &dyn ProfileStore {
        self.profiles.as_ref()
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn token_pair_debug_is_redacted() {
        let tokens = TokenPair {
            access_token: SecretString::from("access-secret"),
            refresh_token: SecretString::from("refresh-secret"),
        };
        let rendered = format!("{tokens:?}");
        assert!(!rendered.contains("access-secret"));
        assert!(!rendered.contains("refresh-secret"));
        assert_eq!(tokens.access_token.expose_secret(), "access-secret");
    }

    #[test]
    fn auth_error_wraps_backend_error() {
        let err: AuthError = BackendError::Timeout.into();
        assert!(matches!(err, AuthError::Backend(BackendError::Timeout)));
        assert_eq!(err.to_string(), "remote call timed out");
    }
}
