//! Admission pipeline of the Tollgate LLM gateway.
//!
//! Every guarded request passes through the same stages: the caller's
//! identity is turned into roles, the roles are checked against the access
//! rules for the requested action, and, for token-consuming actions, the
//! caller's quota is checked before and debited after the handler runs.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod app;
pub mod auth;
pub mod authz;
pub mod config;
pub mod gate;
pub mod middleware;
pub mod prelude;
pub mod quota;

pub use app::{App, AppState};
pub use gate::AuthorizationGate;
pub use middleware::{require_action, require_action_with_quota};
pub use quota::{QuotaLimiter, QuotaLimiterRegistry};

// vim: ts=4
