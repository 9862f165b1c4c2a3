//! Auth state and configuration.

use std::sync::Arc;

use super::clock::{Clock, DEFAULT_SESSION_TIMEOUT_SECONDS, SystemClock};

const DEFAULT_BASE_URL: &str = "http://localhost:3000";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    base_url: String,
    session_timeout_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            session_timeout_seconds: DEFAULT_SESSION_TIMEOUT_SECONDS,
        }
    }

    #[must_use]
    pub fn with_session_timeout_seconds(mut self, seconds: i64) -> Self {
        self.session_timeout_seconds = seconds;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn session_timeout_seconds(&self) -> i64 {
        self.session_timeout_seconds
    }

    /// Only mark cookies secure when the app is served over HTTPS.
    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL.to_string())
    }
}

pub struct AuthState {
    config: AuthConfig,
    clock: Arc<dyn Clock>,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(config: AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn now(&self) -> i64 {
        self.clock.now_unix()
    }
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
