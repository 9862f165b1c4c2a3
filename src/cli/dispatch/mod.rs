//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action to run, currently only the API
//! server with its full configuration.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{backend, session};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let backend_opts = backend::Options::parse(matches)?;
    let session_opts = session::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        backend_url: backend_opts.url,
        backend_anon_key: backend_opts.anon_key,
        backend_timeout_seconds: backend_opts.timeout_seconds,
        session_timeout_seconds: session_opts.session_timeout_seconds,
        base_url: session_opts.base_url,
    }))
}
