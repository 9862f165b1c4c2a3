//! # storegate (Store administration session & role gate)
//!
//! `storegate` fronts the store administration backend. The system of record is
//! a hosted backend platform: a hosted auth provider issues access/refresh
//! tokens and a hosted Postgres database holds the `users` table with roles and
//! store assignments.
//!
//! ## Sessions
//!
//! Sessions live in two cookies (`sb-access-token`, `sb-refresh-token`) with a
//! `Max-Age` equal to the configured session timeout (300 seconds by default).
//! The timeout is enforced here, independently of the provider's own token
//! expiry: the session starts at the access token's `iat` claim and ends
//! `timeout` seconds later. A token without `iat` is treated as expired.
//!
//! ## Roles
//!
//! - **`super_admin`** lands on `/super-admin/dashboard` and owns `/super-admin/*`.
//! - **`admin`** lands on `/admin/{store_id}/dashboard` and owns `/admin/{store_id}/*`.
//! - **`user`**, or an admin without a store, has no destination: protected paths
//!   answer `403` with a generic message instead of redirecting, so there is no loop.
//!
//! ## Failure policy
//!
//! Every remote failure during session resolution (timeouts included) fails
//! closed to the unauthenticated path. Nothing is retried.

pub mod api;
pub mod backend;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
