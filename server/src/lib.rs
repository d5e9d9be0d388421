//! Tollgate: admission control for an LLM gateway.
//!
//! Authenticates callers, derives roles from their token claims, checks the
//! requested action against configured access rules and enforces per-user
//! and cluster-wide token quotas stored in SQLite or PostgreSQL.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod app;
pub mod config;
pub mod prelude;
pub mod routes;

pub use app::{AppBuilder, init_tracing};

// vim: ts=4
