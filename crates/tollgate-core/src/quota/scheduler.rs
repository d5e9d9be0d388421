//! Periodic quota replenishment
//!
//! Requests replenish their own subject lazily. The sweep also tops up
//! subjects that have been idle, so reported quotas stay current.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::QuotaLimiterRegistry;
use crate::prelude::*;

/// Spawns the replenishment sweep, running every `period` (first run after one period)
pub fn spawn_quota_scheduler(registry: Arc<QuotaLimiterRegistry>, period: Duration) -> JoinHandle<()> {
	tokio::spawn(async move {
		let mut interval = tokio::time::interval(period);
		interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
		// The first tick completes immediately
		interval.tick().await;

		info!(period = ?period, limiters = registry.limiters().len(), "quota scheduler started");
		loop {
			interval.tick().await;
			match registry.replenish_all().await {
				Ok(0) => debug!("quota sweep: nothing to replenish"),
				Ok(rows) => debug!(rows = rows, "quota sweep finished"),
				Err(err) => warn!(error = %err, "quota sweep failed, retrying next period"),
			}
		}
	})
}


// vim: ts=4
