use anyhow::{Context, Result, anyhow};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_BACKEND_URL: &str = "backend-url";
pub const ARG_BACKEND_ANON_KEY: &str = "backend-anon-key";
pub const ARG_BACKEND_TIMEOUT_SECONDS: &str = "backend-timeout-seconds";

#[derive(Debug)]
pub struct Options {
    pub url: String,
    pub anon_key: SecretString,
    pub timeout_seconds: u64,
}

impl Options {
    /// # Errors
    /// Returns an error if a required backend argument is missing or the URL is not http(s).
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let url = matches
            .get_one::<String>(ARG_BACKEND_URL)
            .cloned()
            .context("missing required argument: --backend-url")?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(anyhow!("--backend-url must be an http(s) URL: {url}"));
        }
        let anon_key = matches
            .get_one::<String>(ARG_BACKEND_ANON_KEY)
            .cloned()
            .filter(|key| !key.trim().is_empty())
            .context("missing required argument: --backend-anon-key")?;
        let timeout_seconds = matches
            .get_one::<u64>(ARG_BACKEND_TIMEOUT_SECONDS)
            .copied()
            .unwrap_or(5);

        Ok(Self {
            url,
            anon_key: SecretString::from(anon_key),
            timeout_seconds,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_BACKEND_URL)
                .long(ARG_BACKEND_URL)
                .help("Base URL of the hosted backend (auth API lives under /auth/v1)")
                .env("STOREGATE_BACKEND_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_BACKEND_ANON_KEY)
                .long(ARG_BACKEND_ANON_KEY)
                .help("Public (anon) API key sent as the apikey header")
                .env("STOREGATE_BACKEND_ANON_KEY")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_BACKEND_TIMEOUT_SECONDS)
                .long(ARG_BACKEND_TIMEOUT_SECONDS)
                .help("Timeout for every call to the auth provider or database")
                .env("STOREGATE_BACKEND_TIMEOUT_SECONDS")
                .default_value("5")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
