use anyhow::{Result, anyhow};
use clap::{Arg, ArgMatches, Command};
use url::Url;

pub const ARG_SESSION_TIMEOUT_SECONDS: &str = "session-timeout-seconds";
pub const ARG_BASE_URL: &str = "base-url";

#[derive(Debug)]
pub struct Options {
    pub session_timeout_seconds: i64,
    pub base_url: String,
}

impl Options {
    /// # Errors
    /// Returns an error if the base URL cannot be parsed.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let session_timeout_seconds = matches
            .get_one::<i64>(ARG_SESSION_TIMEOUT_SECONDS)
            .copied()
            .unwrap_or(300);
        let base_url = matches
            .get_one::<String>(ARG_BASE_URL)
            .cloned()
            .unwrap_or_else(|| "http://localhost:3000".to_string());
        Url::parse(&base_url).map_err(|e| anyhow!("invalid --base-url {base_url}: {e}"))?;

        Ok(Self {
            session_timeout_seconds,
            base_url,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_TIMEOUT_SECONDS)
                .long(ARG_SESSION_TIMEOUT_SECONDS)
                .help("Fixed session window in seconds, counted from sign-in")
                .env("STOREGATE_SESSION_TIMEOUT_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new(ARG_BASE_URL)
                .long(ARG_BASE_URL)
                .help("Public base URL; https marks session cookies Secure")
                .env("STOREGATE_BASE_URL")
                .default_value("http://localhost:3000"),
        )
}
