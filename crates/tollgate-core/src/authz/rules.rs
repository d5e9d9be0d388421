//! Compiled role and access rules
//!
//! Rules are compiled from configuration exactly once. Every constraint is
//! checked here, so a compiled rule can be evaluated without failing.

use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap, HashSet};

use super::claim_path::ClaimPath;
use super::{RoleSet, WILDCARD_ROLE};
use crate::config::{AccessRuleConfig, RoleRuleConfig, RuleOperator};
use crate::prelude::*;

/// A role rule: grants `roles` when the claim value at `path` compares
/// true against `value` (inverted by `negate`).
#[derive(Debug, Clone)]
pub struct RoleRule {
	path: ClaimPath,
	operator: RuleOperator,
	value: Value,
	negate: bool,
	roles: RoleSet,
	regex: Option<Regex>,
}

impl RoleRule {
	pub fn compile(config: &RoleRuleConfig) -> ClResult<Self> {
		let path = ClaimPath::parse(&config.path)?;

		if config.roles.is_empty() {
			return Err(Error::ConfigError(format!(
				"role rule for '{}' must grant at least one role",
				config.path
			)));
		}
		let mut roles = RoleSet::new();
		for role in &config.roles {
			if role.as_ref() == WILDCARD_ROLE {
				return Err(Error::ConfigError(format!(
					"role rule for '{}' may not grant the wildcard role",
					config.path
				)));
			}
			if !roles.insert(role.clone()) {
				return Err(Error::ConfigError(format!(
					"role rule for '{}' lists role '{}' more than once",
					config.path, role
				)));
			}
		}

		let regex = match config.operator {
			RuleOperator::Match => {
				let pattern = config.value.as_str().ok_or_else(|| {
					Error::ConfigError(format!(
						"role rule for '{}': MATCH requires a string value",
						config.path
					))
				})?;
				let regex = Regex::new(pattern).map_err(|err| {
					Error::ConfigError(format!(
						"role rule for '{}': invalid regex '{}': {}",
						config.path, pattern, err
					))
				})?;
				Some(regex)
			}
			RuleOperator::In if !config.value.is_array() => {
				return Err(Error::ConfigError(format!(
					"role rule for '{}': IN requires an array value",
					config.path
				)));
			}
			_ => None,
		};

		Ok(Self {
			path,
			operator: config.operator,
			value: config.value.clone(),
			negate: config.negate,
			roles,
			regex,
		})
	}

	pub fn compile_all(configs: &[RoleRuleConfig]) -> ClResult<Vec<Self>> {
		configs.iter().map(Self::compile).collect()
	}

	pub fn roles(&self) -> &RoleSet {
		&self.roles
	}

	/// Evaluates the rule against a claim payload. Never fails.
	pub fn matches(&self, claims: &Value) -> bool {
		let found = self.path.evaluate(claims);
		self.compare(&found) != self.negate
	}

	fn compare(&self, found: &[&Value]) -> bool {
		match self.operator {
			RuleOperator::Equals => match found {
				[] => false,
				[single] => *single == &self.value,
				many => self.value.as_array().is_some_and(|expected| {
					expected.len() == many.len()
						&& expected.iter().zip(many).all(|(exp, node)| exp == *node)
				}),
			},
			RuleOperator::Contains => found.iter().any(|node| {
				*node == &self.value
					|| node.as_array().is_some_and(|items| items.contains(&self.value))
			}),
			RuleOperator::In => {
				let Some(allowed) = self.value.as_array() else { return false };
				!found.is_empty() && found.iter().all(|node| allowed.contains(*node))
			}
			RuleOperator::Match => {
				let Some(regex) = &self.regex else { return false };
				if found.is_empty() {
					// An unresolved path is compared as the empty string
					return regex.is_match("");
				}
				found.iter().any(|node| node.as_str().is_some_and(|s| regex.is_match(s)))
			}
		}
	}
}

/// Action to permitted-roles mapping, inverted from the `{role, actions}`
/// entries of the configuration.
#[derive(Debug, Clone, Default)]
pub struct AccessRules {
	by_action: HashMap<Action, RoleSet>,
}

impl AccessRules {
	pub fn compile(configs: &[AccessRuleConfig]) -> ClResult<Self> {
		let mut by_action: HashMap<Action, RoleSet> = HashMap::new();
		let mut seen_roles = HashSet::new();

		for rule in configs {
			if rule.role.trim().is_empty() {
				return Err(Error::ConfigError("access rule role must not be empty".into()));
			}
			if !seen_roles.insert(rule.role.clone()) {
				return Err(Error::ConfigError(format!(
					"role '{}' has more than one access rule",
					rule.role
				)));
			}
			let actions: BTreeSet<Action> = rule.actions.iter().copied().collect();
			if actions.contains(&Action::Admin) && actions.len() > 1 {
				return Err(Error::ConfigError(format!(
					"access rule for role '{}' combines 'admin' with other actions",
					rule.role
				)));
			}
			for action in actions {
				by_action.entry(action).or_default().insert(rule.role.clone());
			}
		}

		Ok(Self { by_action })
	}

	pub fn is_empty(&self) -> bool {
		self.by_action.is_empty()
	}

	/// Roles permitted to perform `action`, if any are configured
	pub fn permitted_roles(&self, action: Action) -> Option<&RoleSet> {
		self.by_action.get(&action)
	}
}


// vim: ts=4
