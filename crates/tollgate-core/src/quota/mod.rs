//! Token quotas
//!
//! A [`QuotaLimiter`] tracks one budget per subject (the whole cluster or one
//! user) in a [`QuotaAdapter`]. The [`QuotaLimiterRegistry`] holds every
//! configured limiter and is what the authorization middleware talks to.
//!
//! [`QuotaAdapter`]: tollgate_types::quota_adapter::QuotaAdapter

pub mod history;
pub mod limiter;
pub mod registry;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod mem_adapter;

use std::sync::Arc;

use crate::prelude::*;

pub use history::TokenUsageHistory;
pub use limiter::QuotaLimiter;
pub use registry::QuotaLimiterRegistry;

/// Source of the current time for quota windows
pub type Clock = Arc<dyn Fn() -> Timestamp + Send + Sync>;

pub fn system_clock() -> Clock {
	Arc::new(Timestamp::now)
}

// vim: ts=4
