use secrecy::SecretString;

/// Settings shared by every component that talks to the hosted backend.
#[derive(Clone)]
pub struct GlobalArgs {
    pub backend_url: String,
    pub backend_anon_key: SecretString,
    pub backend_timeout_seconds: u64,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(backend_url: String, backend_anon_key: SecretString) -> Self {
        Self {
            backend_url,
            backend_anon_key,
            backend_timeout_seconds: 5,
        }
    }

    #[must_use]
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.backend_timeout_seconds = seconds;
        self
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("backend_url", &self.backend_url)
            .field("backend_anon_key", &"***")
            .field("backend_timeout_seconds", &self.backend_timeout_seconds)
            .finish()
    }
}
