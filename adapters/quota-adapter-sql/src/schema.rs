//! Database schema initialization
//!
//! Idempotent: every statement is `IF NOT EXISTS`, so it runs on every connect.

use sqlx::{PgPool, SqlitePool};

pub(crate) async fn init_sqlite(db: &SqlitePool) -> Result<(), sqlx::Error> {
	// Quota limits
	//**************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS quota_limits (
		id text NOT NULL,
		subject char(1) NOT NULL,
		quota_limit integer NOT NULL,
		available integer,
		updated_at integer,
		revoked_at integer,
		PRIMARY KEY(id, subject)
	)",
	)
	.execute(db)
	.await?;

	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_quota_limits_revoked ON quota_limits(subject, revoked_at)",
	)
	.execute(db)
	.await?;

	// Token usage history
	//*********************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS token_usage (
		user_id text NOT NULL,
		provider text NOT NULL,
		model text NOT NULL,
		input_tokens integer NOT NULL DEFAULT 0,
		output_tokens integer NOT NULL DEFAULT 0,
		updated_at integer NOT NULL,
		PRIMARY KEY(user_id, provider, model)
	)",
	)
	.execute(db)
	.await?;

	Ok(())
}

pub(crate) async fn init_postgres(db: &PgPool, namespace: Option<&str>) -> Result<(), sqlx::Error> {
	if let Some(namespace) = namespace {
		// Validated as a plain identifier before connecting
		sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", namespace)).execute(db).await?;
	}

	// Quota limits
	//**************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS quota_limits (
		id text NOT NULL,
		subject char(1) NOT NULL,
		quota_limit bigint NOT NULL,
		available bigint,
		updated_at timestamp with time zone,
		revoked_at timestamp with time zone,
		PRIMARY KEY(id, subject)
	)",
	)
	.execute(db)
	.await?;

	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_quota_limits_revoked ON quota_limits(subject, revoked_at)",
	)
	.execute(db)
	.await?;

	// Token usage history
	//*********************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS token_usage (
		user_id text NOT NULL,
		provider text NOT NULL,
		model text NOT NULL,
		input_tokens bigint NOT NULL DEFAULT 0,
		output_tokens bigint NOT NULL DEFAULT 0,
		updated_at timestamp with time zone NOT NULL,
		PRIMARY KEY(user_id, provider, model)
	)",
	)
	.execute(db)
	.await?;

	Ok(())
}

// vim: ts=4
