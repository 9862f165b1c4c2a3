//! Auth provider client for a GoTrue-compatible REST API.

use super::{AuthError, AuthProvider, AuthUser, BackendError, SignIn, TokenPair};
use crate::APP_USER_AGENT;
use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, error, instrument};
use url::Url;
use uuid::Uuid;

const API_KEY_HEADER: &str = "apikey";

pub struct GoTrueClient {
    client: Client,
    base_url: Url,
    anon_key: SecretString,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    user: UserResponse,
}

#[derive(Deserialize)]
struct UserResponse {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

impl GoTrueClient {
    /// Build a client; every request is bounded by `timeout`.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: &str, anon_key: SecretString, timeout: Duration) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid backend URL: {base_url}"))?;
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build auth provider client")?;

        Ok(Self {
            client,
            base_url,
            anon_key,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::Protocol(format!("invalid endpoint {path}: {e}")))
    }
}

impl std::fmt::Debug for GoTrueClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoTrueClient")
            .field("base_url", &self.base_url.as_str())
            .field("anon_key", &"***")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthProvider for GoTrueClient {
    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SignIn, AuthError> {
        let url = self.endpoint("/auth/v1/token?grant_type=password")?;

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, self.anon_key.expose_secret())
            .json(&json!({
                "email": email,
                "password": password.expose_secret(),
            }))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            return Err(classify_sign_in_error(status, &body));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Protocol(format!("token response: {e}")))?;

        let issued_at = issued_at_from_jwt(&token.access_token);

        Ok(SignIn {
            user: AuthUser {
                id: token.user.id,
                email: token.user.email.unwrap_or_default(),
                issued_at,
            },
            tokens: TokenPair {
                access_token: SecretString::from(token.access_token),
                refresh_token: SecretString::from(token.refresh_token),
            },
        })
    }

    #[instrument(skip_all)]
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, BackendError> {
        let url = self.endpoint("/auth/v1/user")?;

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, self.anon_key.expose_secret())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => {
                let user: UserResponse = response
                    .json()
                    .await
                    .map_err(|e| BackendError::Protocol(format!("user response: {e}")))?;

                Ok(Some(AuthUser {
                    id: user.id,
                    email: user.email.unwrap_or_default(),
                    issued_at: issued_at_from_jwt(access_token),
                }))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("Access token rejected by auth provider");
                Ok(None)
            }
            status => {
                error!("Auth provider user lookup failed: {}", status);
                Err(BackendError::Unavailable(status.to_string()))
            }
        }
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let url = self.endpoint("/auth/v1/logout")?;

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, self.anon_key.expose_secret())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        // An already revoked token is as signed out as it gets.
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            Ok(())
        } else {
            Err(BackendError::Unavailable(status.to_string()))
        }
    }

    #[instrument(skip_all)]
    async fn ping(&self) -> Result<(), BackendError> {
        let url = self.endpoint("/auth/v1/health")?;

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, self.anon_key.expose_secret())
            .send()
            .await
            .map_err(transport_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(BackendError::Unavailable(response.status().to_string()))
        }
    }
}

fn transport_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Unavailable(err.to_string())
    }
}

/// Map a failed password grant to the login-boundary taxonomy.
///
/// Older providers answer `{"error": "invalid_grant", "error_description": ...}`,
/// newer ones `{"error_code": "invalid_credentials", "msg": ...}`.
fn classify_sign_in_error(status: StatusCode, body: &Value) -> AuthError {
    let code = body["error_code"].as_str().or(body["error"].as_str()).unwrap_or("");
    let message = body["msg"]
        .as_str()
        .or(body["error_description"].as_str())
        .or(body["message"].as_str())
        .unwrap_or("");

    if code == "invalid_credentials" || message.contains("Invalid login credentials") {
        AuthError::InvalidCredentials
    } else if code == "email_not_confirmed" || message.contains("Email not confirmed") {
        AuthError::EmailNotConfirmed
    } else if status.is_server_error() {
        AuthError::Backend(BackendError::Unavailable(status.to_string()))
    } else {
        AuthError::Rejected(format!("{status}: {message}"))
    }
}

/// Read the `iat` claim of a JWT without verifying it.
///
/// The provider verifies the token on every `get_user`; this only reads the
/// issuance time for the local session window.
pub(crate) fn issued_at_from_jwt(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    claims["iat"].as_i64()
}
