//! Gateway configuration model.
//!
//! The structs mirror the YAML configuration file. `Config::validate()` compiles
//! every rule once so that malformed configuration is rejected at startup and
//! never reaches request handling.

use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

use crate::authz::rules::{AccessRules, RoleRule};
use crate::prelude::*;
use tollgate_types::quota_adapter::{DatabaseConfig, PostgresConfig, ReplenishPolicy, SqliteConfig};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
	#[serde(default)]
	pub service: ServiceConfig,
	#[serde(default)]
	pub authentication: AuthenticationConfig,
	#[serde(default)]
	pub authorization: AuthorizationConfig,
	#[serde(default)]
	pub quota_handlers: QuotaHandlersConfig,
}

impl Config {
	/// Validates the whole configuration, returning the first violation.
	pub fn validate(&self) -> ClResult<()> {
		RoleRule::compile_all(&self.authorization.role_rules)?;
		AccessRules::compile(&self.authorization.access_rules)?;
		self.quota_handlers.validate()?;
		Ok(())
	}
}

// Service //
//*********//
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
	#[serde(default = "default_listen")]
	pub listen: Box<str>,
}

fn default_listen() -> Box<str> {
	"127.0.0.1:8080".into()
}

impl Default for ServiceConfig {
	fn default() -> Self {
		Self { listen: default_listen() }
	}
}

// Authentication //
//****************//
/// Authentication module producing the caller identity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum AuthModule {
	#[default]
	#[serde(rename = "noop")]
	Noop,
	#[serde(rename = "noop-with-token")]
	NoopWithToken,
	#[serde(rename = "k8s")]
	K8s,
	#[serde(rename = "jwk-token")]
	JwkToken,
}

impl AuthModule {
	pub fn as_str(&self) -> &'static str {
		match self {
			AuthModule::Noop => "noop",
			AuthModule::NoopWithToken => "noop-with-token",
			AuthModule::K8s => "k8s",
			AuthModule::JwkToken => "jwk-token",
		}
	}

	/// Whether identities produced by this module carry claims roles can be derived from
	pub fn supports_role_claims(&self) -> bool {
		match self {
			AuthModule::Noop | AuthModule::NoopWithToken | AuthModule::K8s => false,
			AuthModule::JwkToken => true,
		}
	}
}

impl std::fmt::Display for AuthModule {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthenticationConfig {
	#[serde(default)]
	pub module: AuthModule,
	#[serde(default)]
	pub skip_user_id_check: bool,
}

// Authorization //
//***************//
/// Comparison applied between the extracted claim value and the rule value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleOperator {
	#[serde(alias = "EQUALS")]
	Equals,
	#[serde(alias = "CONTAINS")]
	Contains,
	#[serde(alias = "IN")]
	In,
	#[serde(alias = "MATCH")]
	Match,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleRuleConfig {
	/// JSONPath expression evaluated against the claims
	#[serde(alias = "jsonpath")]
	pub path: Box<str>,
	pub operator: RuleOperator,
	pub value: serde_json::Value,
	#[serde(default)]
	pub negate: bool,
	pub roles: Vec<Box<str>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessRuleConfig {
	pub role: Box<str>,
	pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorizationConfig {
	#[serde(default)]
	pub role_rules: Vec<RoleRuleConfig>,
	#[serde(default)]
	pub access_rules: Vec<AccessRuleConfig>,
}

// Quota handlers //
//****************//
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimiterType {
	ClusterLimiter,
	UserLimiter,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaLimiterConfig {
	#[serde(rename = "type")]
	pub typ: LimiterType,
	pub name: Box<str>,
	pub initial_quota: i64,
	pub quota_increase: i64,
	/// Replenishment window, e.g. "1day", "12h", "60s"
	pub period: Box<str>,
	#[serde(default)]
	pub replenish: ReplenishPolicy,
}

impl QuotaLimiterConfig {
	pub fn period(&self) -> ClResult<Duration> {
		parse_period(&self.period)
	}

	pub fn validate(&self) -> ClResult<()> {
		if self.name.trim().is_empty() {
			return Err(Error::ConfigError("quota limiter name must not be empty".into()));
		}
		if self.initial_quota < 0 {
			return Err(Error::ConfigError(format!(
				"quota limiter '{}': initial_quota must be >= 0",
				self.name
			)));
		}
		if self.quota_increase < 0 {
			return Err(Error::ConfigError(format!(
				"quota limiter '{}': quota_increase must be >= 0",
				self.name
			)));
		}
		self.period()
			.map_err(|err| Error::ConfigError(format!("quota limiter '{}': {}", self.name, err)))?;
		Ok(())
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaSchedulerConfig {
	/// Interval between replenishment sweeps
	#[serde(default = "default_scheduler_period")]
	pub period: Box<str>,
}

fn default_scheduler_period() -> Box<str> {
	"5m".into()
}

impl Default for QuotaSchedulerConfig {
	fn default() -> Self {
		Self { period: default_scheduler_period() }
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaHandlersConfig {
	#[serde(default)]
	pub sqlite: Option<SqliteConfig>,
	#[serde(default)]
	pub postgres: Option<PostgresConfig>,
	#[serde(default)]
	pub limiters: Vec<QuotaLimiterConfig>,
	#[serde(default)]
	pub scheduler: QuotaSchedulerConfig,
	#[serde(default)]
	pub enable_token_history: bool,
}

impl QuotaHandlersConfig {
	/// Storage backend, if any. Both backends configured at once is an error.
	pub fn database(&self) -> ClResult<Option<DatabaseConfig>> {
		match (&self.sqlite, &self.postgres) {
			(Some(_), Some(_)) => Err(Error::ConfigError(
				"only one of quota_handlers.sqlite and quota_handlers.postgres may be set".into(),
			)),
			(Some(sqlite), None) => Ok(Some(DatabaseConfig::Sqlite(sqlite.clone()))),
			(None, Some(postgres)) => Ok(Some(DatabaseConfig::Postgres(postgres.clone()))),
			(None, None) => Ok(None),
		}
	}

	/// Whether any storage is needed at all
	pub fn needs_storage(&self) -> bool {
		!self.limiters.is_empty() || self.enable_token_history
	}

	pub fn scheduler_period(&self) -> ClResult<Duration> {
		parse_period(&self.scheduler.period)
			.map_err(|err| Error::ConfigError(format!("quota_handlers.scheduler: {}", err)))
	}

	pub fn validate(&self) -> ClResult<()> {
		let database = self.database()?;
		if self.needs_storage() && database.is_none() {
			return Err(Error::ConfigError(
				"quota limiters require quota_handlers.sqlite or quota_handlers.postgres".into(),
			));
		}

		let mut names = HashSet::new();
		for limiter in &self.limiters {
			limiter.validate()?;
			if !names.insert(&limiter.name) {
				return Err(Error::ConfigError(format!(
					"duplicate quota limiter name: {}",
					limiter.name
				)));
			}
		}
		self.scheduler_period()?;
		Ok(())
	}
}

/// Parses a human readable, non-zero duration ("60s", "1day", "2h 30m")
pub fn parse_period(period: &str) -> ClResult<Duration> {
	let duration = humantime::parse_duration(period.trim())
		.map_err(|err| Error::ConfigError(format!("invalid period '{}': {}", period, err)))?;
	if duration.is_zero() {
		return Err(Error::ConfigError(format!("period '{}' must not be zero", period)));
	}
	Ok(duration)
}


// vim: ts=4
