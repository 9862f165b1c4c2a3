use crate::{
    api::{self, handlers::auth::AuthConfig},
    cli::{globals::GlobalArgs, telemetry},
};
use anyhow::Result;
use secrecy::SecretString;
use tracing::info;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub backend_url: String,
    pub backend_anon_key: SecretString,
    pub backend_timeout_seconds: u64,
    pub session_timeout_seconds: i64,
    pub base_url: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database or auth provider client cannot be set up,
/// or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let globals = GlobalArgs::new(args.backend_url, args.backend_anon_key)
        .with_timeout_seconds(args.backend_timeout_seconds);

    let auth_config =
        AuthConfig::new(args.base_url).with_session_timeout_seconds(args.session_timeout_seconds);

    let result = api::new(args.port, args.dsn, &globals, auth_config).await;

    telemetry::shutdown_tracer();

    result
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("dsn", redact_dsn(&args.dsn)),
        ("backend_url", args.backend_url.clone()),
        ("backend_timeout", format!("{}s", args.backend_timeout_seconds)),
        ("session_timeout", format!("{}s", args.session_timeout_seconds)),
        ("base_url", args.base_url.clone()),
    ];
    log_entries("Startup configuration", &entries);
}

fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => "invalid-dsn".to_string(),
    }
}

fn log_entries(title: &str, entries: &[(&str, String)]) {
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!("{}\n\n{title}:", banner());
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn banner() -> String {
    format!(
        "storegate - {} - {}",
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    )
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.len() > 7 {
        trimmed[..7].to_string()
    } else {
        trimmed.to_string()
    }
}
