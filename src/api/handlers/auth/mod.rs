//! Auth handlers and supporting modules.
//!
//! This module owns the session lifecycle and the role gate in front of every
//! route.
//!
//! ## Session window
//!
//! A session is valid for a fixed window (300 seconds by default) starting at
//! the access token's `iat` claim. The window is never extended by activity
//! and there is no token refresh: when it ends, the gate deletes both cookies
//! and the user signs in again.
//!
//! ## Gate
//!
//! - Public paths (`/`, `/test`, `/login`, `/logout`, `/health`, `/auth/*`) are
//!   always served. `/login` is the one exception: a signed-in principal with a
//!   landing path is sent there instead.
//! - Protected paths require a session whose role owns the path. Otherwise the
//!   request is redirected (303) to the role's landing path, or to `/login`.
//! - Principals without a landing path get a `403` instead of a redirect.

mod clock;
mod errors;
pub(crate) mod gate;
pub(crate) mod login;
pub(crate) mod principal;
pub(crate) mod routes;
pub(crate) mod session;
mod state;
pub(crate) mod types;
mod utils;

pub use clock::{Clock, DEFAULT_SESSION_TIMEOUT_SECONDS, Session, SystemClock, is_expired};
pub use gate::{GateOutcome, RouteDecision, SessionState, decide, gate};
pub use principal::{Principal, Role, UserProfile};
pub use routes::{RouteClass, classify, target_for_role};
pub use session::{ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME};
pub use state::{AuthConfig, AuthState};

#[cfg(test)]
pub(crate) mod test_support;
