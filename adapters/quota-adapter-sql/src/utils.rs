//! Shared utilities for the SQL adapter

use tollgate_types::prelude::*;

/// Log database error for debugging
pub(crate) fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

/// Log a database error and map it to [`Error::DbError`]
pub(crate) fn db_err(err: sqlx::Error) -> Error {
	inspect(&err);
	Error::DbError
}

/// Check that a PostgreSQL schema name is a plain identifier
pub(crate) fn validate_identifier(name: &str) -> ClResult<&str> {
	let valid = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
		&& name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
	if valid {
		Ok(name)
	} else {
		Err(Error::ConfigError(format!("invalid postgres namespace: '{}'", name)))
	}
}


// vim: ts=4
