//! In-memory quota adapter for unit tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use super::Clock;
use crate::prelude::*;
use tollgate_types::quota_adapter::{
	AVAILABLE_FLOOR, QuotaAdapter, QuotaAdapterFactory, QuotaRecord, Replenish, SubjectType,
	TokenUsage, TokenUsageRecord,
};

#[derive(Debug, Default)]
pub struct MemAdapter {
	rows: Mutex<HashMap<(Box<str>, SubjectType), QuotaRecord>>,
	usage: Mutex<Vec<TokenUsageRecord>>,
	pub fail: AtomicBool,
}

impl MemAdapter {
	fn check(&self) -> ClResult<()> {
		if self.fail.load(Ordering::SeqCst) { Err(Error::DbError) } else { Ok(()) }
	}
}

#[async_trait]
impl QuotaAdapter for MemAdapter {
	fn backend(&self) -> &'static str {
		"memory"
	}

	async fn connected(&self) -> bool {
		!self.fail.load(Ordering::SeqCst)
	}

	async fn read_quota(&self, subject: SubjectType, id: &str) -> ClResult<Option<QuotaRecord>> {
		self.check()?;
		Ok(self.rows.lock().unwrap().get(&(id.into(), subject)).cloned())
	}

	async fn init_quota(
		&self,
		subject: SubjectType,
		id: &str,
		quota_limit: i64,
		now: Timestamp,
	) -> ClResult<()> {
		self.check()?;
		self.rows
			.lock()
			.unwrap()
			.entry((id.into(), subject))
			.and_modify(|row| row.quota_limit = quota_limit)
			.or_insert_with(|| QuotaRecord {
				id: id.into(),
				subject,
				quota_limit,
				available: quota_limit,
				updated_at: None,
				revoked_at: Some(now),
			});
		Ok(())
	}

	async fn add_available(
		&self,
		subject: SubjectType,
		id: &str,
		delta: i64,
		now: Timestamp,
	) -> ClResult<u64> {
		self.check()?;
		let mut rows = self.rows.lock().unwrap();
		let Some(row) = rows.get_mut(&(id.into(), subject)) else { return Ok(0) };
		row.available = row.available.saturating_add(delta).max(AVAILABLE_FLOOR);
		row.updated_at = Some(now);
		Ok(1)
	}

	async fn replenish(
		&self,
		subject: SubjectType,
		id: Option<&str>,
		replenish: Replenish,
		cutoff: Timestamp,
		now: Timestamp,
	) -> ClResult<u64> {
		self.check()?;
		let mut count = 0;
		for row in self.rows.lock().unwrap().values_mut() {
			if row.subject != subject || id.is_some_and(|id| id != row.id.as_ref()) {
				continue;
			}
			if !row.revoked_at.is_some_and(|revoked| revoked < cutoff) {
				continue;
			}
			row.quota_limit = replenish.quota_limit();
			row.available = match replenish {
				Replenish::IncreaseBy { amount, quota_limit } => (row.available + amount).min(quota_limit),
				Replenish::ResetTo(amount) => amount,
			};
			row.revoked_at = Some(now);
			row.updated_at = Some(now);
			count += 1;
		}
		Ok(count)
	}

	async fn record_token_usage(
		&self,
		user_id: &str,
		usage: &TokenUsage,
		now: Timestamp,
	) -> ClResult<()> {
		self.check()?;
		let provider = usage.provider.clone().unwrap_or_default();
		let model = usage.model.clone().unwrap_or_default();
		let mut records = self.usage.lock().unwrap();
		if let Some(rec) = records
			.iter_mut()
			.find(|r| r.user_id.as_ref() == user_id && r.provider == provider && r.model == model)
		{
			rec.input_tokens += usage.input_tokens;
			rec.output_tokens += usage.output_tokens;
			rec.updated_at = now;
		} else {
			records.push(TokenUsageRecord {
				user_id: user_id.into(),
				provider,
				model,
				input_tokens: usage.input_tokens,
				output_tokens: usage.output_tokens,
				updated_at: now,
			});
		}
		Ok(())
	}

	async fn list_token_usage(&self, user_id: &str) -> ClResult<Vec<TokenUsageRecord>> {
		self.check()?;
		Ok(self.usage.lock().unwrap().iter().filter(|r| r.user_id.as_ref() == user_id).cloned().collect())
	}
}

/// Hands out a fresh adapter per call and remembers every one of them
#[derive(Default)]
pub struct MemFactory {
	pub adapters: Mutex<Vec<Arc<MemAdapter>>>,
}

#[async_trait]
impl QuotaAdapterFactory for MemFactory {
	async fn connect(&self) -> ClResult<Arc<dyn QuotaAdapter>> {
		let adapter = Arc::new(MemAdapter::default());
		self.adapters.lock().unwrap().push(adapter.clone());
		Ok(adapter)
	}
}

/// Settable clock
#[derive(Clone, Default)]
pub struct MockClock(pub Arc<AtomicI64>);

impl MockClock {
	pub fn at(secs: i64) -> Self {
		Self(Arc::new(AtomicI64::new(secs)))
	}

	pub fn advance(&self, secs: i64) {
		self.0.fetch_add(secs, Ordering::SeqCst);
	}

	pub fn clock(&self) -> Clock {
		let now = self.0.clone();
		Arc::new(move || Timestamp(now.load(Ordering::SeqCst)))
	}
}

// vim: ts=4
