//! SQLite and PostgreSQL quota adapter
//!
//! Each [`QuotaAdapterSql`] owns a single-connection pool. No explicit
//! transactions are used: every statement commits on its own.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

use async_trait::async_trait;
use sqlx::{
	PgPool, SqlitePool,
	postgres::{self, PgConnectOptions, PgPoolOptions},
	sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tollgate_types::prelude::*;
use tollgate_types::quota_adapter::{
	DatabaseConfig, PgSslMode, PostgresConfig, QuotaAdapter, QuotaAdapterFactory, QuotaRecord,
	Replenish, SubjectType, TokenUsage, TokenUsageRecord,
};

mod quota;
mod schema;
mod token_usage;
mod utils;

use utils::{db_err, validate_identifier};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub(crate) enum Db {
	Sqlite(SqlitePool),
	Postgres(PgPool),
}

#[derive(Debug)]
pub struct QuotaAdapterSql {
	db: Db,
}

impl QuotaAdapterSql {
	pub async fn connect(config: &DatabaseConfig) -> ClResult<Self> {
		match config {
			DatabaseConfig::Sqlite(sqlite) => Self::sqlite(&*sqlite.db_path).await,
			DatabaseConfig::Postgres(pg) => Self::postgres(pg).await,
		}
	}

	pub async fn sqlite(path: impl AsRef<Path>) -> ClResult<Self> {
		let opts = SqliteConnectOptions::new()
			.filename(path.as_ref())
			.create_if_missing(true)
			.journal_mode(SqliteJournalMode::Wal)
			.busy_timeout(BUSY_TIMEOUT);
		let db = SqlitePoolOptions::new()
			.max_connections(1)
			.idle_timeout(None)
			.max_lifetime(None)
			.connect_with(opts)
			.await
			.map_err(db_err)?;

		schema::init_sqlite(&db).await.map_err(db_err)?;
		debug!(path = %path.as_ref().display(), "sqlite quota storage connected");

		Ok(Self { db: Db::Sqlite(db) })
	}

	pub async fn postgres(config: &PostgresConfig) -> ClResult<Self> {
		let mut opts = PgConnectOptions::new()
			.host(&config.host)
			.port(config.port)
			.database(&config.db)
			.username(&config.user)
			.password(&config.password)
			.ssl_mode(ssl_mode(config.ssl_mode));
		if let Some(ca_cert_path) = &config.ca_cert_path {
			opts = opts.ssl_root_cert(&**ca_cert_path);
		}

		let adapter = Self::postgres_with_options(opts, config.namespace.as_deref()).await?;
		debug!(host = %config.host, db = %config.db, "postgres quota storage connected");
		Ok(adapter)
	}

	/// Connects with prepared options, e.g. parsed from a `postgres://` URL.
	/// Tables live in `namespace` when given, created if missing.
	pub async fn postgres_with_options(
		mut opts: PgConnectOptions,
		namespace: Option<&str>,
	) -> ClResult<Self> {
		let namespace = namespace.map(validate_identifier).transpose()?;
		if let Some(namespace) = namespace {
			opts = opts.options([("search_path", namespace)]);
		}

		let db = PgPoolOptions::new()
			.max_connections(1)
			.idle_timeout(None)
			.max_lifetime(None)
			.connect_with(opts)
			.await
			.map_err(db_err)?;

		schema::init_postgres(&db, namespace).await.map_err(db_err)?;

		Ok(Self { db: Db::Postgres(db) })
	}
}

fn ssl_mode(mode: PgSslMode) -> postgres::PgSslMode {
	match mode {
		PgSslMode::Disable => postgres::PgSslMode::Disable,
		PgSslMode::Allow => postgres::PgSslMode::Allow,
		PgSslMode::Prefer => postgres::PgSslMode::Prefer,
		PgSslMode::Require => postgres::PgSslMode::Require,
		PgSslMode::VerifyCa => postgres::PgSslMode::VerifyCa,
		PgSslMode::VerifyFull => postgres::PgSslMode::VerifyFull,
	}
}

#[async_trait]
impl QuotaAdapter for QuotaAdapterSql {
	fn backend(&self) -> &'static str {
		match self.db {
			Db::Sqlite(_) => "sqlite",
			Db::Postgres(_) => "postgres",
		}
	}

	async fn connected(&self) -> bool {
		let res = match &self.db {
			Db::Sqlite(db) => sqlx::query("SELECT 1").execute(db).await.map(|_| ()),
			Db::Postgres(db) => sqlx::query("SELECT 1").execute(db).await.map(|_| ()),
		};
		res.inspect_err(utils::inspect).is_ok()
	}

	// Quota rows
	//************
	async fn read_quota(&self, subject: SubjectType, id: &str) -> ClResult<Option<QuotaRecord>> {
		quota::read(&self.db, subject, id).await
	}

	async fn init_quota(
		&self,
		subject: SubjectType,
		id: &str,
		quota_limit: i64,
		now: Timestamp,
	) -> ClResult<()> {
		quota::init(&self.db, subject, id, quota_limit, now).await
	}

	async fn add_available(
		&self,
		subject: SubjectType,
		id: &str,
		delta: i64,
		now: Timestamp,
	) -> ClResult<u64> {
		quota::add_available(&self.db, subject, id, delta, now).await
	}

	async fn replenish(
		&self,
		subject: SubjectType,
		id: Option<&str>,
		replenish: Replenish,
		cutoff: Timestamp,
		now: Timestamp,
	) -> ClResult<u64> {
		quota::replenish(&self.db, subject, id, replenish, cutoff, now).await
	}

	// Token usage history
	//*********************
	async fn record_token_usage(
		&self,
		user_id: &str,
		usage: &TokenUsage,
		now: Timestamp,
	) -> ClResult<()> {
		token_usage::record(&self.db, user_id, usage, now).await
	}

	async fn list_token_usage(&self, user_id: &str) -> ClResult<Vec<TokenUsageRecord>> {
		token_usage::list(&self.db, user_id).await
	}
}

/// Opens a new [`QuotaAdapterSql`] for every limiter
#[derive(Debug, Clone)]
pub struct SqlConnector {
	config: DatabaseConfig,
}

impl SqlConnector {
	pub fn new(config: DatabaseConfig) -> Self {
		Self { config }
	}
}

#[async_trait]
impl QuotaAdapterFactory for SqlConnector {
	async fn connect(&self) -> ClResult<Arc<dyn QuotaAdapter>> {
		Ok(Arc::new(QuotaAdapterSql::connect(&self.config).await?))
	}
}

// vim: ts=4
