//! Adapter that persists token quotas and token usage history.
//!
//! Every quota limiter owns its own adapter instance: the storage
//! connection behind an adapter is never shared between limiters.
//! Instances are created through a [`QuotaAdapterFactory`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fmt::Debug;
use std::sync::Arc;

use crate::prelude::*;
use crate::types::serialize_timestamp_iso;

/// Fixed subject id of the cluster-wide quota row
pub const CLUSTER_SUBJECT_ID: &str = "";

/// The entity a quota is tracked against
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubjectType {
	Cluster,
	User,
}

impl SubjectType {
	/// Single character tag stored in the `subject` column
	pub fn as_char(&self) -> char {
		match self {
			SubjectType::Cluster => 'c',
			SubjectType::User => 'u',
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			SubjectType::Cluster => "c",
			SubjectType::User => "u",
		}
	}

	pub fn from_char(c: char) -> ClResult<Self> {
		match c {
			'c' => Ok(SubjectType::Cluster),
			'u' => Ok(SubjectType::User),
			_ => Err(Error::ValidationError(format!("unknown quota subject: {}", c))),
		}
	}
}

impl std::fmt::Display for SubjectType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			SubjectType::Cluster => write!(f, "cluster"),
			SubjectType::User => write!(f, "user"),
		}
	}
}

/// How a quota row is replenished once its window has elapsed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplenishPolicy {
	/// `available = available + quota_increase`
	#[default]
	Increase,
	/// `available = quota_limit`
	Reset,
}

/// Replenishment statement parameters.
///
/// Both variants carry the configured ceiling, which is written back to
/// `quota_limit` so the stored row follows configuration changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Replenish {
	/// Add `amount` to `available`, never exceeding `quota_limit`
	IncreaseBy { amount: i64, quota_limit: i64 },
	/// Set `available` to the given amount
	ResetTo(i64),
}

impl Replenish {
	/// Value assigned to, or added to, `available`
	pub fn amount(&self) -> i64 {
		match self {
			Replenish::IncreaseBy { amount, .. } => *amount,
			Replenish::ResetTo(amount) => *amount,
		}
	}

	pub fn quota_limit(&self) -> i64 {
		match self {
			Replenish::IncreaseBy { quota_limit, .. } => *quota_limit,
			Replenish::ResetTo(quota_limit) => *quota_limit,
		}
	}
}

/// Lowest value `available` is ever stored with. Debits below it are
/// clamped so the column stays a 64-bit integer.
pub const AVAILABLE_FLOOR: i64 = i64::MIN / 2;

/// Persisted quota row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaRecord {
	pub id: Box<str>,
	pub subject: SubjectType,
	pub quota_limit: i64,
	pub available: i64,
	pub updated_at: Option<Timestamp>,
	pub revoked_at: Option<Timestamp>,
}

/// Token consumption reported by a guarded operation
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
	pub input_tokens: i64,
	pub output_tokens: i64,
	pub provider: Option<Box<str>>,
	pub model: Option<Box<str>>,
}

/// Largest number of tokens a single operation may report
pub const MAX_REPORTED_TOKENS: i64 = 1 << 40;

impl TokenUsage {
	pub fn new(input_tokens: i64, output_tokens: i64) -> Self {
		Self { input_tokens, output_tokens, provider: None, model: None }
	}

	pub fn total(&self) -> i64 {
		self.input_tokens.saturating_add(self.output_tokens)
	}

	/// Rejects negative counts and totals above [`MAX_REPORTED_TOKENS`]
	pub fn validate(&self) -> ClResult<()> {
		validate_token_counts(self.input_tokens, self.output_tokens)
	}
}

pub fn validate_token_counts(input_tokens: i64, output_tokens: i64) -> ClResult<()> {
	if input_tokens < 0 || output_tokens < 0 {
		return Err(Error::ValidationError("token counts must not be negative".into()));
	}
	if input_tokens.saturating_add(output_tokens) > MAX_REPORTED_TOKENS {
		return Err(Error::ValidationError(format!(
			"token usage exceeds {} tokens per operation",
			MAX_REPORTED_TOKENS
		)));
	}
	Ok(())
}

/// Accumulated token usage of one user with one provider/model pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsageRecord {
	pub user_id: Box<str>,
	pub provider: Box<str>,
	pub model: Box<str>,
	pub input_tokens: i64,
	pub output_tokens: i64,
	#[serde(serialize_with = "serialize_timestamp_iso")]
	pub updated_at: Timestamp,
}

/// SQLite storage settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteConfig {
	pub db_path: Box<str>,
}

/// SSL mode for PostgreSQL connections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PgSslMode {
	Disable,
	Allow,
	#[default]
	Prefer,
	Require,
	VerifyCa,
	VerifyFull,
}

/// PostgreSQL storage settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostgresConfig {
	#[serde(default = "default_pg_host")]
	pub host: Box<str>,
	#[serde(default = "default_pg_port")]
	pub port: u16,
	pub db: Box<str>,
	pub user: Box<str>,
	pub password: Box<str>,
	#[serde(default)]
	pub namespace: Option<Box<str>>,
	#[serde(default)]
	pub ssl_mode: PgSslMode,
	#[serde(default)]
	pub ca_cert_path: Option<Box<str>>,
}

fn default_pg_host() -> Box<str> {
	"localhost".into()
}

fn default_pg_port() -> u16 {
	5432
}

/// The single active storage backend
#[derive(Debug, Clone)]
pub enum DatabaseConfig {
	Sqlite(SqliteConfig),
	Postgres(PostgresConfig),
}

#[async_trait]
pub trait QuotaAdapter: Debug + Send + Sync {
	/// Backend name for diagnostics ("sqlite", "postgres")
	fn backend(&self) -> &'static str;

	/// Trivial liveness probe. Never fails, reports health instead.
	async fn connected(&self) -> bool;

	// Quota rows
	//************
	async fn read_quota(&self, subject: SubjectType, id: &str) -> ClResult<Option<QuotaRecord>>;

	/// Insert a fresh row unless one already exists for `(id, subject)`.
	/// `revoked_at` starts at `now`, opening the first window.
	async fn init_quota(
		&self,
		subject: SubjectType,
		id: &str,
		quota_limit: i64,
		now: Timestamp,
	) -> ClResult<()>;

	/// Add `delta` (negative to consume) to `available`, touching `updated_at`.
	/// Returns the number of affected rows.
	async fn add_available(
		&self,
		subject: SubjectType,
		id: &str,
		delta: i64,
		now: Timestamp,
	) -> ClResult<u64>;

	/// Replenish rows whose window started before `cutoff`, setting `revoked_at = now`.
	/// `id = None` sweeps every row of the subject type.
	async fn replenish(
		&self,
		subject: SubjectType,
		id: Option<&str>,
		replenish: Replenish,
		cutoff: Timestamp,
		now: Timestamp,
	) -> ClResult<u64>;

	// Token usage history
	//*********************
	async fn record_token_usage(
		&self,
		user_id: &str,
		usage: &TokenUsage,
		now: Timestamp,
	) -> ClResult<()>;

	async fn list_token_usage(&self, user_id: &str) -> ClResult<Vec<TokenUsageRecord>>;
}

/// Opens a new, exclusively owned adapter instance on every call.
#[async_trait]
pub trait QuotaAdapterFactory: Send + Sync {
	async fn connect(&self) -> ClResult<Arc<dyn QuotaAdapter>>;
}


// vim: ts=4
