//! Quota limiter registry
//!
//! Checks run against every limiter and stop at the first failure.
//! Consumption is attempted on every limiter even if one of them fails;
//! the first failure is returned once all limiters have been tried.

use std::collections::BTreeMap;
use std::time::Duration;

use super::{Clock, QuotaLimiter, TokenUsageHistory};
use crate::config::QuotaHandlersConfig;
use crate::prelude::*;
use tollgate_types::quota_adapter::{QuotaAdapterFactory, TokenUsage, TokenUsageRecord};

#[derive(Debug, Default)]
pub struct QuotaLimiterRegistry {
	limiters: Vec<QuotaLimiter>,
	history: Option<TokenUsageHistory>,
}

impl QuotaLimiterRegistry {
	/// A registry without limiters: every subject has unlimited budget
	pub fn empty() -> Self {
		Self::default()
	}

	pub fn new(limiters: Vec<QuotaLimiter>, history: Option<TokenUsageHistory>) -> Self {
		Self { limiters, history }
	}

	/// Builds every configured limiter, each on its own adapter instance
	pub async fn build(
		config: &QuotaHandlersConfig,
		factory: &dyn QuotaAdapterFactory,
	) -> ClResult<Self> {
		config.validate()?;

		let mut limiters = Vec::with_capacity(config.limiters.len());
		for limiter_config in &config.limiters {
			let limiter = QuotaLimiter::new(limiter_config, factory.connect().await?)?;
			info!(
				limiter = %limiter.name(),
				subject = %limiter.subject_type(),
				initial_quota = limiter_config.initial_quota,
				period = %limiter_config.period,
				"quota limiter ready"
			);
			limiters.push(limiter);
		}
		if limiters.is_empty() {
			info!("no quota limiters configured, token budget is unlimited");
		}

		let history = if config.enable_token_history {
			Some(TokenUsageHistory::new(factory.connect().await?))
		} else {
			None
		};

		Ok(Self { limiters, history })
	}

	pub fn with_clock(self, clock: &Clock) -> Self {
		Self {
			limiters: self.limiters.into_iter().map(|l| l.with_clock(clock.clone())).collect(),
			history: self.history.map(|h| h.with_clock(clock.clone())),
		}
	}

	pub fn limiters(&self) -> &[QuotaLimiter] {
		&self.limiters
	}

	pub fn is_empty(&self) -> bool {
		self.limiters.is_empty()
	}

	pub fn history(&self) -> Option<&TokenUsageHistory> {
		self.history.as_ref()
	}

	/// Shortest replenishment window among the limiters
	pub fn shortest_period(&self) -> Option<Duration> {
		self.limiters.iter().map(QuotaLimiter::period).min()
	}

	/// Fails with the first limiter that has no budget left for `subject_id`
	pub async fn check_tokens_available(&self, subject_id: &str) -> ClResult<()> {
		for limiter in &self.limiters {
			limiter.ensure_available_quota(subject_id).await?;
		}
		Ok(())
	}

	/// Debits `usage` from every limiter and records it in the usage history
	pub async fn consume_tokens(&self, subject_id: &str, usage: &TokenUsage) -> ClResult<()> {
		usage.validate()?;

		let mut first_err = None;
		for limiter in &self.limiters {
			if let Err(err) =
				limiter.consume_tokens(usage.input_tokens, usage.output_tokens, subject_id).await
			{
				error!(limiter = %limiter.name(), subject_id = subject_id, error = %err, "token consumption failed");
				first_err.get_or_insert(err);
			}
		}

		if let Some(history) = &self.history {
			if let Err(err) = history.record(subject_id, usage).await {
				error!(subject_id = subject_id, error = %err, "recording token usage failed");
				first_err.get_or_insert(err);
			}
		}

		match first_err {
			Some(err) => Err(err),
			None => Ok(()),
		}
	}

	/// Remaining budget of `subject_id` per limiter name
	pub async fn get_available_quotas(&self, subject_id: &str) -> ClResult<BTreeMap<Box<str>, i64>> {
		let mut quotas = BTreeMap::new();
		for limiter in &self.limiters {
			quotas.insert(limiter.name().into(), limiter.available_quota(subject_id).await?);
		}
		Ok(quotas)
	}

	pub async fn token_usage(&self, user_id: &str) -> ClResult<Vec<TokenUsageRecord>> {
		match &self.history {
			Some(history) => history.list(user_id).await,
			None => Ok(Vec::new()),
		}
	}

	/// Runs the replenishment sweep on every limiter, returns the number of rows touched
	pub async fn replenish_all(&self) -> ClResult<u64> {
		let mut total = 0;
		let mut first_err = None;
		for limiter in &self.limiters {
			match limiter.replenish().await {
				Ok(count) => total += count,
				Err(err) => {
					error!(limiter = %limiter.name(), error = %err, "quota replenishment failed");
					first_err.get_or_insert(err);
				}
			}
		}
		match first_err {
			Some(err) => Err(err),
			None => Ok(total),
		}
	}

	/// True when every storage connection answers
	pub async fn connected(&self) -> bool {
		for limiter in &self.limiters {
			if !limiter.connected().await {
				warn!(limiter = %limiter.name(), "quota storage not connected");
				return false;
			}
		}
		match &self.history {
			Some(history) => history.connected().await,
			None => true,
		}
	}
}


// vim: ts=4
