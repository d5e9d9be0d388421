//! Token usage history statements

use tollgate_types::prelude::*;
use tollgate_types::quota_adapter::{TokenUsage, TokenUsageRecord};

use crate::Db;
use crate::utils::db_err;

type UsageRow = (String, String, String, i64, i64, i64);

pub(crate) async fn record(
	db: &Db,
	user_id: &str,
	usage: &TokenUsage,
	now: Timestamp,
) -> ClResult<()> {
	let provider = usage.provider.as_deref().unwrap_or_default();
	let model = usage.model.as_deref().unwrap_or_default();

	match db {
		Db::Sqlite(db) => {
			sqlx::query(
				"INSERT INTO token_usage (user_id, provider, model, input_tokens, output_tokens, updated_at)
				VALUES (?1, ?2, ?3, ?4, ?5, ?6)
				ON CONFLICT (user_id, provider, model) DO UPDATE SET
					input_tokens = token_usage.input_tokens + excluded.input_tokens,
					output_tokens = token_usage.output_tokens + excluded.output_tokens,
					updated_at = excluded.updated_at",
			)
			.bind(user_id)
			.bind(provider)
			.bind(model)
			.bind(usage.input_tokens)
			.bind(usage.output_tokens)
			.bind(now.0)
			.execute(db)
			.await
			.map_err(db_err)?;
		}
		Db::Postgres(db) => {
			sqlx::query(
				"INSERT INTO token_usage (user_id, provider, model, input_tokens, output_tokens, updated_at)
				VALUES ($1, $2, $3, $4, $5, to_timestamp($6))
				ON CONFLICT (user_id, provider, model) DO UPDATE SET
					input_tokens = token_usage.input_tokens + EXCLUDED.input_tokens,
					output_tokens = token_usage.output_tokens + EXCLUDED.output_tokens,
					updated_at = EXCLUDED.updated_at",
			)
			.bind(user_id)
			.bind(provider)
			.bind(model)
			.bind(usage.input_tokens)
			.bind(usage.output_tokens)
			.bind(now.0)
			.execute(db)
			.await
			.map_err(db_err)?;
		}
	}
	Ok(())
}

pub(crate) async fn list(db: &Db, user_id: &str) -> ClResult<Vec<TokenUsageRecord>> {
	let rows: Vec<UsageRow> = match db {
		Db::Sqlite(db) => sqlx::query_as(
			"SELECT user_id, provider, model, input_tokens, output_tokens, updated_at
			FROM token_usage WHERE user_id = ?1 ORDER BY provider, model",
		)
		.bind(user_id)
		.fetch_all(db)
		.await
		.map_err(db_err)?,
		Db::Postgres(db) => sqlx::query_as(
			"SELECT user_id, provider, model, input_tokens, output_tokens,
				CAST(EXTRACT(EPOCH FROM updated_at) AS BIGINT)
			FROM token_usage WHERE user_id = $1 ORDER BY provider, model",
		)
		.bind(user_id)
		.fetch_all(db)
		.await
		.map_err(db_err)?,
	};

	Ok(rows
		.into_iter()
		.map(|(user_id, provider, model, input_tokens, output_tokens, updated_at)| {
			TokenUsageRecord {
				user_id: user_id.into(),
				provider: provider.into(),
				model: model.into(),
				input_tokens,
				output_tokens,
				updated_at: Timestamp(updated_at),
			}
		})
		.collect())
}

// vim: ts=4
