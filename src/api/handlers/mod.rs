//! API handlers for storegate.
//!
//! `auth` holds the session gate and sign-in flow; the remaining modules are
//! the pages it protects plus service probes.

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod root;
