//! Session clock: fixed-window session expiry.
//!
//! A session is valid for exactly `timeout` seconds after issuance. The
//! window is enforced here, independently of the auth provider's own token
//! lifetime.

use uuid::Uuid;

pub const DEFAULT_SESSION_TIMEOUT_SECONDS: i64 = 5 * 60;

/// Source of "now" in unix seconds.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> i64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub issued_at: Option<i64>,
    pub expires_at: Option<i64>,
}

impl Session {
    /// Build a session from its issuance time; `expires_at` is always
    /// `issued_at + timeout`. Missing issuance metadata yields a session
    /// without expiry, which [`is_expired`] treats as expired.
    #[must_use]
    pub fn issue(user_id: Uuid, issued_at: Option<i64>, timeout_seconds: i64) -> Self {
        Self {
            user_id,
            issued_at,
            expires_at: issued_at.map(|issued| issued.saturating_add(timeout_seconds)),
        }
    }
}

/// True iff `now >= issued_at + timeout`, or when expiry metadata is absent.
#[must_use]
pub fn is_expired(session: &Session, now: i64) -> bool {
    match (session.issued_at, session.expires_at) {
        (Some(_), Some(expires_at)) => now >= expires_at,
        _ => true,
    }
}
