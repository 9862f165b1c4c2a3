//! In-memory collaborators for auth unit tests.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use uuid::Uuid;

use super::clock::Clock;
use crate::backend::{
    AuthError, AuthProvider, AuthUser, BackendError, ProfileRow, ProfileStore, SignIn, TokenPair,
};

pub(crate) struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.0
    }
}

/// `Cookie` header value carrying `token` as the access cookie.
pub(crate) fn access_cookie(token: &str) -> String {
    format!("sb-access-token={token}")
}

/// Active profile row with a derived email and name.
pub(crate) fn profile_row(id: Uuid, role: Option<&str>, store: Option<&str>) -> ProfileRow {
    ProfileRow {
        id,
        email: format!("{id}@example.com"),
        name: "Test User".to_string(),
        role: role.map(ToString::to_string),
        store_id: store.map(ToString::to_string),
        active: true,
    }
}

#[derive(Default)]
pub(crate) struct FakeProfiles {
    rows: HashMap<Uuid, ProfileRow>,
    failure: Option<BackendError>,
}

impl FakeProfiles {
    pub(crate) fn with(rows: Vec<ProfileRow>) -> Self {
        Self {
            rows: rows.into_iter().map(|row| (row.id, row)).collect(),
            failure: None,
        }
    }

    pub(crate) fn unavailable() -> Self {
        Self {
            rows: HashMap::new(),
            failure: Some(BackendError::Timeout),
        }
    }
}

#[async_trait]
impl ProfileStore for FakeProfiles {
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<ProfileRow>, BackendError> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(self.rows.get(&user_id).cloned()),
        }
    }

    async fn ping(&self) -> Result<(), BackendError> {
        self.failure.clone().map_or(Ok(()), Err)
    }
}

struct Account {
    password: String,
    user: AuthUser,
    token: String,
}

/// Auth provider keyed by access token. Sign-in succeeds for registered
/// accounts and hands out the account's token.
#[derive(Default)]
pub(crate) struct FakeAuth {
    tokens: HashMap<String, AuthUser>,
    accounts: HashMap<String, Account>,
    sign_in_error: Option<AuthError>,
    failure: Option<BackendError>,
    signed_out: Arc<Mutex<Vec<String>>>,
}

impl FakeAuth {
    pub(crate) fn with_token(mut self, token: &str, user: AuthUser) -> Self {
        self.tokens.insert(token.to_string(), user);
        self
    }

    pub(crate) fn with_account(mut self, password: &str, token: &str, user: AuthUser) -> Self {
        self.tokens.insert(token.to_string(), user.clone());
        self.accounts.insert(
            user.email.clone(),
            Account {
                password: password.to_string(),
                user,
                token: token.to_string(),
            },
        );
        self
    }

    pub(crate) fn rejecting_sign_in(mut self, err: AuthError) -> Self {
        self.sign_in_error = Some(err);
        self
    }

    /// Every call fails with `err`.
    pub(crate) fn failing(mut self, err: BackendError) -> Self {
        self.failure = Some(err);
        self
    }

    /// Shared view of the tokens passed to `sign_out`.
    pub(crate) fn sign_outs(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.signed_out)
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SignIn, AuthError> {
        if let Some(err) = &self.failure {
            return Err(AuthError::Backend(err.clone()));
        }
        if let Some(err) = &self.sign_in_error {
            return Err(err.clone());
        }
        match self.accounts.get(email) {
            Some(account) if account.password == password.expose_secret() => Ok(SignIn {
                user: account.user.clone(),
                tokens: TokenPair {
                    access_token: SecretString::from(account.token.clone()),
                    refresh_token: SecretString::from(format!("{}-refresh", account.token)),
                },
            }),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, BackendError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(self.tokens.get(access_token).cloned())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        if let Ok(mut calls) = self.signed_out.lock() {
            calls.push(access_token.to_string());
        }
        self.failure.clone().map_or(Ok(()), Err)
    }

    async fn ping(&self) -> Result<(), BackendError> {
        self.failure.clone().map_or(Ok(()), Err)
    }
}
