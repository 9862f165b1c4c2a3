//! Request gate: per-request session resolution and route protection.
//!
//! Every request passes through [`gate`]. The access cookie is resolved to a
//! [`SessionState`], [`decide`] maps that state and the path to a
//! [`RouteDecision`], and the middleware either forwards the request (with the
//! [`Principal`] attached) or answers with a redirect.
//!
//! Remote failures never surface here: a failed token lookup or profile read
//! is the same as having no session.

use axum::{
    Json,
    extract::{Extension, Request},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::{
    clock::{Session, is_expired},
    errors::ACCESS_MISCONFIGURED,
    principal::{Principal, resolve_role},
    routes::{LOGIN_PATH, RouteClass, classify, is_login_path, owns_path, target_for_role},
    session::{access_token, append_cleared_cookies, issues_session},
    state::AuthState,
    types::ErrorResponse,
};
use crate::backend::Backend;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    SessionExpired,
    Authenticated(Principal),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(String),
    /// The principal's role has no landing path; answered with a generic 403.
    Forbidden,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateOutcome {
    pub decision: RouteDecision,
    /// Delete both session cookies on the way out.
    pub clear_cookies: bool,
}

impl GateOutcome {
    const fn keep(decision: RouteDecision) -> Self {
        Self {
            decision,
            clear_cookies: false,
        }
    }
}

/// Attached to `/login` requests from a principal whose role has no landing path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MisconfiguredAccess;

/// Resolve the request's access cookie into a session state.
#[instrument(skip_all)]
pub async fn resolve_session(
    headers: &HeaderMap,
    backend: &Backend,
    auth_state: &AuthState,
) -> SessionState {
    let Some(token) = access_token(headers) else {
        return SessionState::Unauthenticated;
    };

    let user = match backend.auth().get_user(&token).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            debug!("Access token rejected by auth provider");
            return SessionState::SessionExpired;
        }
        Err(err) => {
            warn!("Auth provider lookup failed, treating request as unauthenticated: {err}");
            return SessionState::Unauthenticated;
        }
    };

    let session = Session::issue(
        user.id,
        user.issued_at,
        auth_state.config().session_timeout_seconds(),
    );
    if is_expired(&session, auth_state.now()) {
        debug!(user_id = %user.id, "Session expired");
        return SessionState::SessionExpired;
    }

    match resolve_role(backend.profiles(), user.id).await {
        Ok(profile) => SessionState::Authenticated(Principal::from(profile)),
        Err(err) => {
            debug!(user_id = %user.id, "Profile resolution failed: {err:?}");
            SessionState::Unauthenticated
        }
    }
}

/// Map a session state and request path to the gate's decision.
#[must_use]
pub fn decide(state: &SessionState, path: &str) -> GateOutcome {
    let class = classify(path);

    match state {
        SessionState::Unauthenticated => GateOutcome::keep(anonymous_decision(class)),
        SessionState::SessionExpired => GateOutcome {
            decision: anonymous_decision(class),
            clear_cookies: true,
        },
        SessionState::Authenticated(principal) => {
            let target = target_for_role(principal.role, principal.store_id.as_deref());

            let decision = if is_login_path(path) {
                // Misconfigured principals stay on the login page to read the notice.
                target.map_or(RouteDecision::Allow, RouteDecision::Redirect)
            } else if class == RouteClass::Public {
                RouteDecision::Allow
            } else {
                match target {
                    Err(_) => RouteDecision::Forbidden,
                    Ok(_) if owns_path(principal, path) => RouteDecision::Allow,
                    Ok(home) => RouteDecision::Redirect(home),
                }
            };

            GateOutcome::keep(decision)
        }
    }
}

fn anonymous_decision(class: RouteClass) -> RouteDecision {
    match class {
        RouteClass::Public => RouteDecision::Allow,
        RouteClass::Protected => RouteDecision::Redirect(LOGIN_PATH.to_string()),
    }
}

/// axum middleware wrapping every route.
pub async fn gate(
    Extension(backend): Extension<Backend>,
    Extension(auth_state): Extension<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let state = resolve_session(request.headers(), &backend, &auth_state).await;
    let path = request.uri().path().to_string();
    let outcome = decide(&state, &path);

    debug!(path = %path, decision = ?outcome.decision, "Gate decision");

    let mut response = match outcome.decision {
        RouteDecision::Allow => {
            if let SessionState::Authenticated(principal) = state {
                if is_login_path(&path)
                    && target_for_role(principal.role, principal.store_id.as_deref()).is_err()
                {
                    request.extensions_mut().insert(MisconfiguredAccess);
                }
                request.extensions_mut().insert(principal);
            }
            next.run(request).await
        }
        RouteDecision::Redirect(target) => Redirect::to(&target).into_response(),
        RouteDecision::Forbidden => (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::message(ACCESS_MISCONFIGURED)),
        )
            .into_response(),
    };

    // A fresh sign-in on this request replaces the stale cookies.
    if outcome.clear_cookies && !issues_session(&response) {
        append_cleared_cookies(&mut response, auth_state.config());
    }

    response
}
