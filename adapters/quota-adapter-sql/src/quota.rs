//! Quota row statements
//!
//! Timestamps are unix seconds. SQLite stores them as integers, PostgreSQL
//! as `timestamp with time zone`, converted in the statements.

use tollgate_types::prelude::*;
use tollgate_types::quota_adapter::{AVAILABLE_FLOOR, QuotaRecord, Replenish, SubjectType};

use crate::Db;
use crate::utils::db_err;

type QuotaRow = (String, String, i64, Option<i64>, Option<i64>, Option<i64>);

fn to_record(row: QuotaRow) -> ClResult<QuotaRecord> {
	let (id, subject, quota_limit, available, updated_at, revoked_at) = row;
	let subject = subject.chars().next().ok_or(Error::DbError).and_then(SubjectType::from_char)?;
	Ok(QuotaRecord {
		id: id.into(),
		subject,
		quota_limit,
		available: available.unwrap_or(quota_limit),
		updated_at: updated_at.map(Timestamp),
		revoked_at: revoked_at.map(Timestamp),
	})
}

pub(crate) async fn read(db: &Db, subject: SubjectType, id: &str) -> ClResult<Option<QuotaRecord>> {
	let row: Option<QuotaRow> = match db {
		Db::Sqlite(db) => sqlx::query_as(
			"SELECT id, subject, quota_limit, available, updated_at, revoked_at
			FROM quota_limits WHERE id = ?1 AND subject = ?2",
		)
		.bind(id)
		.bind(subject.as_str())
		.fetch_optional(db)
		.await
		.map_err(db_err)?,
		Db::Postgres(db) => sqlx::query_as(
			"SELECT id, subject, quota_limit, available,
				CAST(EXTRACT(EPOCH FROM updated_at) AS BIGINT),
				CAST(EXTRACT(EPOCH FROM revoked_at) AS BIGINT)
			FROM quota_limits WHERE id = $1 AND subject = $2",
		)
		.bind(id)
		.bind(subject.as_str())
		.fetch_optional(db)
		.await
		.map_err(db_err)?,
	};
	row.map(to_record).transpose()
}

/// Creates the row, or refreshes `quota_limit` of an existing one
pub(crate) async fn init(
	db: &Db,
	subject: SubjectType,
	id: &str,
	quota_limit: i64,
	now: Timestamp,
) -> ClResult<()> {
	match db {
		Db::Sqlite(db) => {
			sqlx::query(
				"INSERT INTO quota_limits (id, subject, quota_limit, available, revoked_at)
				VALUES (?1, ?2, ?3, ?3, ?4)
				ON CONFLICT (id, subject) DO UPDATE SET quota_limit = excluded.quota_limit",
			)
			.bind(id)
			.bind(subject.as_str())
			.bind(quota_limit)
			.bind(now.0)
			.execute(db)
			.await
			.map_err(db_err)?;
		}
		Db::Postgres(db) => {
			sqlx::query(
				"INSERT INTO quota_limits (id, subject, quota_limit, available, revoked_at)
				VALUES ($1, $2, $3, $3, to_timestamp($4))
				ON CONFLICT (id, subject) DO UPDATE SET quota_limit = excluded.quota_limit",
			)
			.bind(id)
			.bind(subject.as_str())
			.bind(quota_limit)
			.bind(now.0)
			.execute(db)
			.await
			.map_err(db_err)?;
		}
	}
	Ok(())
}

/// Adds `delta` to `available`, clamped at [`AVAILABLE_FLOOR`]
pub(crate) async fn add_available(
	db: &Db,
	subject: SubjectType,
	id: &str,
	delta: i64,
	now: Timestamp,
) -> ClResult<u64> {
	let res = match db {
		Db::Sqlite(db) => sqlx::query(
			"UPDATE quota_limits SET available = MAX(available + ?1, ?5), updated_at = ?2
			WHERE id = ?3 AND subject = ?4",
		)
		.bind(delta)
		.bind(now.0)
		.bind(id)
		.bind(subject.as_str())
		.bind(AVAILABLE_FLOOR)
		.execute(db)
		.await
		.map_err(db_err)?
		.rows_affected(),
		Db::Postgres(db) => sqlx::query(
			"UPDATE quota_limits SET available = GREATEST(available + $1, $5), updated_at = to_timestamp($2)
			WHERE id = $3 AND subject = $4",
		)
		.bind(delta)
		.bind(now.0)
		.bind(id)
		.bind(subject.as_str())
		.bind(AVAILABLE_FLOOR)
		.execute(db)
		.await
		.map_err(db_err)?
		.rows_affected(),
	};
	Ok(res)
}

/// Replenishes rows whose window started before `cutoff`.
/// `quota_limit` is set to the configured ceiling of `replenish`, and an
/// increase never raises `available` above it.
pub(crate) async fn replenish(
	db: &Db,
	subject: SubjectType,
	id: Option<&str>,
	replenish: Replenish,
	cutoff: Timestamp,
	now: Timestamp,
) -> ClResult<u64> {
	let (amount, quota_limit) = (replenish.amount(), replenish.quota_limit());

	let res = match db {
		Db::Sqlite(db) => {
			let set = match replenish {
				Replenish::IncreaseBy { .. } => "available = MIN(available + ?1, ?5)",
				Replenish::ResetTo(_) => "available = ?1",
			};
			let id_filter = if id.is_some() { " AND id = ?6" } else { "" };
			let sql = format!(
				"UPDATE quota_limits SET {}, quota_limit = ?5, revoked_at = ?2, updated_at = ?2
				WHERE subject = ?3 AND revoked_at < ?4{}",
				set, id_filter
			);
			let mut query = sqlx::query(&sql)
				.bind(amount)
				.bind(now.0)
				.bind(subject.as_str())
				.bind(cutoff.0)
				.bind(quota_limit);
			if let Some(id) = id {
				query = query.bind(id);
			}
			query.execute(db).await.map_err(db_err)?.rows_affected()
		}
		Db::Postgres(db) => {
			let set = match replenish {
				Replenish::IncreaseBy { .. } => "available = LEAST(available + $1, $5)",
				Replenish::ResetTo(_) => "available = $1",
			};
			let id_filter = if id.is_some() { " AND id = $6" } else { "" };
			let sql = format!(
				"UPDATE quota_limits SET {}, quota_limit = $5, revoked_at = to_timestamp($2),
					updated_at = to_timestamp($2)
				WHERE subject = $3 AND revoked_at < to_timestamp($4){}",
				set, id_filter
			);
			let mut query = sqlx::query(&sql)
				.bind(amount)
				.bind(now.0)
				.bind(subject.as_str())
				.bind(cutoff.0)
				.bind(quota_limit);
			if let Some(id) = id {
				query = query.bind(id);
			}
			query.execute(db).await.map_err(db_err)?.rows_affected()
		}
	};
	Ok(res)
}

// vim: ts=4
