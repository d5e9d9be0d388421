//! Quota limiter
//!
//! One accounting algorithm for both subject types. A cluster limiter keeps a
//! single row under [`CLUSTER_SUBJECT_ID`] and ignores the subject id it is
//! called with; a user limiter keeps one row per user id.
//!
//! Replenishment is windowed: once `period` has passed since a row's
//! `revoked_at`, the next access (or the next scheduler sweep) tops the row
//! up in one step and opens a new window.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use super::{Clock, system_clock};
use crate::config::{LimiterType, QuotaLimiterConfig};
use crate::prelude::*;
use tollgate_types::quota_adapter::{
	CLUSTER_SUBJECT_ID, QuotaAdapter, QuotaRecord, Replenish, ReplenishPolicy, SubjectType,
	validate_token_counts,
};

#[derive(Clone)]
pub struct QuotaLimiter {
	name: Box<str>,
	subject: SubjectType,
	initial_quota: i64,
	quota_increase: i64,
	period: Duration,
	policy: ReplenishPolicy,
	adapter: Arc<dyn QuotaAdapter>,
	clock: Clock,
}

impl Debug for QuotaLimiter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("QuotaLimiter")
			.field("name", &self.name)
			.field("subject", &self.subject)
			.field("initial_quota", &self.initial_quota)
			.field("quota_increase", &self.quota_increase)
			.field("period", &self.period)
			.field("policy", &self.policy)
			.field("backend", &self.adapter.backend())
			.finish_non_exhaustive()
	}
}

impl QuotaLimiter {
	pub fn new(config: &QuotaLimiterConfig, adapter: Arc<dyn QuotaAdapter>) -> ClResult<Self> {
		config.validate()?;
		let subject = match config.typ {
			LimiterType::ClusterLimiter => SubjectType::Cluster,
			LimiterType::UserLimiter => SubjectType::User,
		};
		Ok(Self {
			name: config.name.clone(),
			subject,
			initial_quota: config.initial_quota,
			quota_increase: config.quota_increase,
			period: config.period()?,
			policy: config.replenish,
			adapter,
			clock: system_clock(),
		})
	}

	pub fn with_clock(mut self, clock: Clock) -> Self {
		self.clock = clock;
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn subject_type(&self) -> SubjectType {
		self.subject
	}

	pub fn period(&self) -> Duration {
		self.period
	}

	/// Row id the limiter accounts `subject_id` under
	fn row_id<'a>(&self, subject_id: &'a str) -> &'a str {
		match self.subject {
			SubjectType::Cluster => CLUSTER_SUBJECT_ID,
			SubjectType::User => subject_id,
		}
	}

	fn now(&self) -> Timestamp {
		(self.clock)()
	}

	/// Window start before which a row is due for replenishment
	fn cutoff(&self, now: Timestamp) -> Timestamp {
		now.saturating_sub(self.period)
	}

	/// Remaining budget of the subject. The row is created with
	/// `initial_quota` on first access.
	pub async fn available_quota(&self, subject_id: &str) -> ClResult<i64> {
		let record = self.read_or_init(self.row_id(subject_id)).await?;
		Ok(record.available)
	}

	async fn read_or_init(&self, id: &str) -> ClResult<QuotaRecord> {
		if let Some(record) = self.adapter.read_quota(self.subject, id).await? {
			return Ok(record);
		}

		let now = self.now();
		self.adapter.init_quota(self.subject, id, self.initial_quota, now).await?;
		debug!(limiter = %self.name, subject = %self.subject, id = id, "quota row created");
		let record = self.adapter.read_quota(self.subject, id).await?;
		Ok(record.unwrap_or_else(|| QuotaRecord {
			id: id.into(),
			subject: self.subject,
			quota_limit: self.initial_quota,
			available: self.initial_quota,
			updated_at: None,
			revoked_at: Some(now),
		}))
	}

	/// Seconds until the row's current window has elapsed and the next
	/// access replenishes it
	fn retry_after(&self, record: &QuotaRecord, now: Timestamp) -> u64 {
		let Some(revoked_at) = record.revoked_at else { return self.period.as_secs() };
		// Replenishment needs strictly more than `period` to have passed
		let due = revoked_at.saturating_add(self.period).0.saturating_add(1);
		u64::try_from(due.saturating_sub(now.0)).unwrap_or(0).max(1)
	}

	/// Replenishes the subject if its window has elapsed, then fails with
	/// [`Error::QuotaExceeded`] if nothing is left. Does not consume.
	pub async fn ensure_available_quota(&self, subject_id: &str) -> ClResult<()> {
		let id = self.row_id(subject_id);
		let now = self.now();
		let replenished = self
			.adapter
			.replenish(self.subject, Some(id), self.replenish_op(), self.cutoff(now), now)
			.await?;
		if replenished > 0 {
			debug!(limiter = %self.name, subject = %self.subject, id = id, "quota replenished");
		}

		let record = self.read_or_init(id).await?;
		let available = record.available;
		if available <= 0 {
			warn!(
				limiter = %self.name,
				subject = %self.subject,
				id = id,
				available = available,
				"quota exceeded"
			);
			return Err(Error::QuotaExceeded {
				limiter: self.name.clone(),
				subject_type: self.subject,
				subject_id: id.into(),
				available,
				retry_after: Some(self.retry_after(&record, now)),
			});
		}
		Ok(())
	}

	/// Debits `input_tokens + output_tokens` from the subject's budget
	pub async fn consume_tokens(
		&self,
		input_tokens: i64,
		output_tokens: i64,
		subject_id: &str,
	) -> ClResult<()> {
		validate_token_counts(input_tokens, output_tokens)?;
		let total = input_tokens + output_tokens;
		if total == 0 {
			return Ok(());
		}

		let id = self.row_id(subject_id);
		let now = self.now();
		self.adapter.init_quota(self.subject, id, self.initial_quota, now).await?;
		let updated = self.adapter.add_available(self.subject, id, -total, now).await?;
		if updated == 0 {
			error!(limiter = %self.name, subject = %self.subject, id = id, "quota row vanished during consume");
			return Err(Error::Internal(format!("quota row missing in limiter {}", self.name)));
		}
		debug!(limiter = %self.name, subject = %self.subject, id = id, tokens = total, "tokens consumed");
		Ok(())
	}

	/// Adds `quota_increase` to every row whose window has elapsed
	pub async fn increase_quota(&self) -> ClResult<u64> {
		self.sweep(self.increase_op()).await
	}

	/// Resets every row whose window has elapsed back to `initial_quota`
	pub async fn revoke_quota(&self) -> ClResult<u64> {
		self.sweep(Replenish::ResetTo(self.initial_quota)).await
	}

	/// Runs the configured replenishment policy over every elapsed row
	pub async fn replenish(&self) -> ClResult<u64> {
		self.sweep(self.replenish_op()).await
	}

	pub async fn connected(&self) -> bool {
		self.adapter.connected().await
	}

	fn replenish_op(&self) -> Replenish {
		match self.policy {
			ReplenishPolicy::Increase => self.increase_op(),
			ReplenishPolicy::Reset => Replenish::ResetTo(self.initial_quota),
		}
	}

	fn increase_op(&self) -> Replenish {
		Replenish::IncreaseBy { amount: self.quota_increase, quota_limit: self.initial_quota }
	}

	async fn sweep(&self, op: Replenish) -> ClResult<u64> {
		let now = self.now();
		let count = self.adapter.replenish(self.subject, None, op, self.cutoff(now), now).await?;
		if count > 0 {
			info!(limiter = %self.name, subject = %self.subject, rows = count, "quota window elapsed, replenished");
		}
		Ok(count)
	}
}


// vim: ts=4
