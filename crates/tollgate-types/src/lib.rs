//! Shared types, adapter traits, and core utilities for the Tollgate gateway.
//!
//! This crate contains the foundational types that are shared between the
//! server crate, the core admission pipeline and the storage adapters.
//! Adapter crates only depend on this crate, so they compile in parallel
//! with the core crate.

pub mod action;
pub mod auth;
pub mod error;
pub mod extract;
pub mod prelude;
pub mod quota_adapter;
pub mod types;

// vim: ts=4
