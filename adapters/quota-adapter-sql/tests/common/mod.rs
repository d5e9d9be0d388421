//! Storage scenarios shared by the SQLite and PostgreSQL tests

#![allow(dead_code)]

use tollgate_types::quota_adapter::{
	AVAILABLE_FLOOR, QuotaAdapter, Replenish, SubjectType, TokenUsage,
};
use tollgate_types::types::Timestamp;

fn increase_by(amount: i64) -> Replenish {
	Replenish::IncreaseBy { amount, quota_limit: 100 }
}

pub async fn missing_row(adapter: &dyn QuotaAdapter) {
	let row = adapter.read_quota(SubjectType::User, "u1").await.unwrap();
	assert!(row.is_none());
}

pub async fn init_keeps_balance_and_refreshes_limit(adapter: &dyn QuotaAdapter) {
	adapter.init_quota(SubjectType::User, "u1", 100, Timestamp(1_000)).await.unwrap();
	adapter.add_available(SubjectType::User, "u1", -30, Timestamp(1_010)).await.unwrap();
	adapter.init_quota(SubjectType::User, "u1", 500, Timestamp(1_020)).await.unwrap();

	let row = adapter.read_quota(SubjectType::User, "u1").await.unwrap().unwrap();
	assert_eq!(row.quota_limit, 500);
	assert_eq!(row.available, 70);
	assert_eq!(row.updated_at, Some(Timestamp(1_010)));
	assert_eq!(row.revoked_at, Some(Timestamp(1_000)));
}

pub async fn subjects_are_separate_rows(adapter: &dyn QuotaAdapter) {
	adapter.init_quota(SubjectType::User, "", 10, Timestamp(1_000)).await.unwrap();
	adapter.init_quota(SubjectType::Cluster, "", 1_000, Timestamp(1_000)).await.unwrap();
	adapter.add_available(SubjectType::Cluster, "", -1, Timestamp(1_000)).await.unwrap();

	let user = adapter.read_quota(SubjectType::User, "").await.unwrap().unwrap();
	let cluster = adapter.read_quota(SubjectType::Cluster, "").await.unwrap().unwrap();
	assert_eq!(user.available, 10);
	assert_eq!(cluster.available, 999);
	assert_eq!(cluster.subject, SubjectType::Cluster);
}

pub async fn consume_can_go_negative(adapter: &dyn QuotaAdapter) {
	adapter.init_quota(SubjectType::User, "u1", 100, Timestamp(1_000)).await.unwrap();
	assert_eq!(adapter.add_available(SubjectType::User, "u1", -60, Timestamp(1_001)).await.unwrap(), 1);
	assert_eq!(adapter.add_available(SubjectType::User, "u1", -50, Timestamp(1_002)).await.unwrap(), 1);
	assert_eq!(adapter.add_available(SubjectType::User, "u2", -50, Timestamp(1_002)).await.unwrap(), 0);

	let row = adapter.read_quota(SubjectType::User, "u1").await.unwrap().unwrap();
	assert_eq!(row.available, -10);
}

pub async fn consume_is_clamped_at_floor(adapter: &dyn QuotaAdapter) {
	adapter.init_quota(SubjectType::Cluster, "", 100, Timestamp(1_000)).await.unwrap();
	adapter.add_available(SubjectType::Cluster, "", -i64::MAX, Timestamp(1_001)).await.unwrap();

	let row = adapter.read_quota(SubjectType::Cluster, "").await.unwrap().unwrap();
	assert_eq!(row.available, AVAILABLE_FLOOR);
}

pub async fn replenish_respects_window(adapter: &dyn QuotaAdapter) {
	adapter.init_quota(SubjectType::User, "old", 100, Timestamp(1_000)).await.unwrap();
	adapter.init_quota(SubjectType::User, "new", 100, Timestamp(1_050)).await.unwrap();
	adapter.add_available(SubjectType::User, "old", -100, Timestamp(1_000)).await.unwrap();
	adapter.add_available(SubjectType::User, "new", -100, Timestamp(1_050)).await.unwrap();

	// Window of 60s at t=1070: only "old" has elapsed
	let count = adapter
		.replenish(SubjectType::User, None, increase_by(40), Timestamp(1_010), Timestamp(1_070))
		.await
		.unwrap();
	assert_eq!(count, 1);

	let old = adapter.read_quota(SubjectType::User, "old").await.unwrap().unwrap();
	assert_eq!(old.available, 40);
	assert_eq!(old.revoked_at, Some(Timestamp(1_070)));
	let new = adapter.read_quota(SubjectType::User, "new").await.unwrap().unwrap();
	assert_eq!(new.available, 0);
}

pub async fn replenish_single_subject_and_cap(adapter: &dyn QuotaAdapter) {
	adapter.init_quota(SubjectType::User, "a", 100, Timestamp(1_000)).await.unwrap();
	adapter.init_quota(SubjectType::User, "b", 100, Timestamp(1_000)).await.unwrap();
	adapter.add_available(SubjectType::User, "a", -10, Timestamp(1_000)).await.unwrap();
	adapter.add_available(SubjectType::User, "b", -10, Timestamp(1_000)).await.unwrap();

	let count = adapter
		.replenish(SubjectType::User, Some("a"), increase_by(50), Timestamp(1_001), Timestamp(1_100))
		.await
		.unwrap();
	assert_eq!(count, 1);

	let a = adapter.read_quota(SubjectType::User, "a").await.unwrap().unwrap();
	assert_eq!(a.available, 100);
	let b = adapter.read_quota(SubjectType::User, "b").await.unwrap().unwrap();
	assert_eq!(b.available, 90);
}

pub async fn replenish_follows_raised_limit(adapter: &dyn QuotaAdapter) {
	adapter.init_quota(SubjectType::User, "u1", 100, Timestamp(1_000)).await.unwrap();
	adapter.add_available(SubjectType::User, "u1", -100, Timestamp(1_000)).await.unwrap();

	let raised = Replenish::IncreaseBy { amount: 500, quota_limit: 1_000 };
	adapter
		.replenish(SubjectType::User, Some("u1"), raised, Timestamp(1_001), Timestamp(1_100))
		.await
		.unwrap();

	let row = adapter.read_quota(SubjectType::User, "u1").await.unwrap().unwrap();
	assert_eq!(row.available, 500);
	assert_eq!(row.quota_limit, 1_000);
}

pub async fn reset(adapter: &dyn QuotaAdapter) {
	adapter.init_quota(SubjectType::Cluster, "", 100, Timestamp(1_000)).await.unwrap();
	adapter.add_available(SubjectType::Cluster, "", -250, Timestamp(1_000)).await.unwrap();
	adapter
		.replenish(SubjectType::Cluster, None, Replenish::ResetTo(100), Timestamp(1_001), Timestamp(1_100))
		.await
		.unwrap();

	let row = adapter.read_quota(SubjectType::Cluster, "").await.unwrap().unwrap();
	assert_eq!(row.available, 100);
	assert_eq!(row.updated_at, Some(Timestamp(1_100)));
}

pub async fn token_usage_upsert(adapter: &dyn QuotaAdapter) {
	let mut usage = TokenUsage::new(10, 20);
	usage.provider = Some("openai".into());
	usage.model = Some("gpt-4o-mini".into());
	adapter.record_token_usage("u1", &usage, Timestamp(1_000)).await.unwrap();
	adapter.record_token_usage("u1", &usage, Timestamp(1_100)).await.unwrap();
	adapter.record_token_usage("u1", &TokenUsage::new(1, 2), Timestamp(1_200)).await.unwrap();
	adapter.record_token_usage("u2", &usage, Timestamp(1_200)).await.unwrap();

	let records = adapter.list_token_usage("u1").await.unwrap();
	assert_eq!(records.len(), 2);
	assert_eq!(records[0].provider.as_ref(), "");
	assert_eq!((records[0].input_tokens, records[0].output_tokens), (1, 2));
	assert_eq!(records[1].model.as_ref(), "gpt-4o-mini");
	assert_eq!((records[1].input_tokens, records[1].output_tokens), (20, 40));
	assert_eq!(records[1].updated_at, Timestamp(1_100));
}

// vim: ts=4
