//! Per-user token usage history

use std::fmt::Debug;
use std::sync::Arc;

use super::{Clock, system_clock};
use crate::prelude::*;
use tollgate_types::quota_adapter::{QuotaAdapter, TokenUsage, TokenUsageRecord};

/// Accumulates consumed tokens per `(user, provider, model)`
#[derive(Clone)]
pub struct TokenUsageHistory {
	adapter: Arc<dyn QuotaAdapter>,
	clock: Clock,
}

impl Debug for TokenUsageHistory {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TokenUsageHistory").field("backend", &self.adapter.backend()).finish()
	}
}

impl TokenUsageHistory {
	pub fn new(adapter: Arc<dyn QuotaAdapter>) -> Self {
		Self { adapter, clock: system_clock() }
	}

	pub fn with_clock(mut self, clock: Clock) -> Self {
		self.clock = clock;
		self
	}

	pub async fn record(&self, user_id: &str, usage: &TokenUsage) -> ClResult<()> {
		self.adapter.record_token_usage(user_id, usage, (self.clock)()).await
	}

	pub async fn list(&self, user_id: &str) -> ClResult<Vec<TokenUsageRecord>> {
		self.adapter.list_token_usage(user_id).await
	}

	pub async fn connected(&self) -> bool {
		self.adapter.connected().await
	}
}


// vim: ts=4
