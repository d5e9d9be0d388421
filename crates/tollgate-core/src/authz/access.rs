//! Access resolvers

use std::collections::BTreeSet;
use std::fmt::Debug;

use super::rules::AccessRules;
use super::{RoleSet, WILDCARD_ROLE};
use crate::prelude::*;

/// Decides which actions a role set may perform
pub trait AccessResolver: Debug + Send + Sync {
	fn check_access(&self, action: Action, roles: &RoleSet) -> bool;

	fn get_actions(&self, roles: &RoleSet) -> BTreeSet<Action>;
}

/// Grants every action to everyone
#[derive(Debug, Default)]
pub struct NoopAccessResolver;

impl AccessResolver for NoopAccessResolver {
	fn check_access(&self, _action: Action, _roles: &RoleSet) -> bool {
		true
	}

	fn get_actions(&self, _roles: &RoleSet) -> BTreeSet<Action> {
		Action::ALL.iter().copied().collect()
	}
}

/// Grants actions according to the configured access rules
#[derive(Debug)]
pub struct RuleBasedAccessResolver {
	rules: AccessRules,
}

impl RuleBasedAccessResolver {
	pub fn new(rules: AccessRules) -> Self {
		Self { rules }
	}

	/// A rule for the wildcard role applies to every caller
	fn has_action(&self, action: Action, roles: &RoleSet) -> bool {
		self.rules.permitted_roles(action).is_some_and(|permitted| {
			permitted.contains(WILDCARD_ROLE) || !permitted.is_disjoint(roles)
		})
	}
}

impl AccessResolver for RuleBasedAccessResolver {
	fn check_access(&self, action: Action, roles: &RoleSet) -> bool {
		self.has_action(Action::Admin, roles) || self.has_action(action, roles)
	}

	fn get_actions(&self, roles: &RoleSet) -> BTreeSet<Action> {
		if self.has_action(Action::Admin, roles) {
			return Action::ALL.iter().copied().filter(|a| *a != Action::Admin).collect();
		}
		Action::ALL.iter().copied().filter(|a| self.has_action(*a, roles)).collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::authz::with_wildcard;
	use crate::config::AccessRuleConfig;

	fn roles(names: &[&str]) -> RoleSet {
		names.iter().map(|r| (*r).into()).collect()
	}

	fn resolver(rules: &[(&str, &[Action])]) -> RuleBasedAccessResolver {
		let configs: Vec<AccessRuleConfig> = rules
			.iter()
			.map(|(role, actions)| AccessRuleConfig { role: (*role).into(), actions: actions.to_vec() })
			.collect();
		RuleBasedAccessResolver::new(AccessRules::compile(&configs).unwrap())
	}

	#[test]
	fn test_noop_grants_everything() {
		for action in Action::ALL {
			assert!(NoopAccessResolver.check_access(*action, &RoleSet::new()));
		}
		assert_eq!(NoopAccessResolver.get_actions(&RoleSet::new()).len(), Action::ALL.len());
	}

	#[test]
	fn test_intersection() {
		let r = resolver(&[("admin", &[Action::GetConfig]), ("user", &[Action::Query])]);

		assert!(r.check_access(Action::GetConfig, &roles(&["admin"])));
		assert!(!r.check_access(Action::GetConfig, &roles(&["user"])));
		assert!(r.check_access(Action::Query, &roles(&["user", "other"])));
		assert!(!r.check_access(Action::Query, &RoleSet::new()));
		assert!(!r.check_access(Action::GetShields, &roles(&["admin", "user"])));
	}

	#[test]
	fn test_wildcard_rule_with_gate_wildcard() {
		// Access rule {QUERY: ["admin", "*"]}: everyone passes once the gate adds "*"
		let r = resolver(&[("admin", &[Action::Query]), ("*", &[Action::Query])]);
		assert!(r.check_access(Action::Query, &with_wildcard(&RoleSet::new())));
		assert!(!r.check_access(Action::GetConfig, &with_wildcard(&RoleSet::new())));
	}

	#[test]
	fn test_admin_grants_everything() {
		let r = resolver(&[("root", &[Action::Admin]), ("user", &[Action::Query])]);

		assert!(r.check_access(Action::DeleteOthersConversations, &roles(&["root"])));
		let actions = r.get_actions(&roles(&["root"]));
		assert_eq!(actions.len(), Action::ALL.len() - 1);
		assert!(!actions.contains(&Action::Admin));
	}

	#[test]
	fn test_caller_wildcard_is_not_a_superuser() {
		let r = resolver(&[("root", &[Action::Admin]), ("user", &[Action::Query])]);
		let everyone = with_wildcard(&RoleSet::new());
		assert!(!r.check_access(Action::Query, &everyone));
		assert!(!r.check_access(Action::GetConfig, &everyone));
		assert!(r.get_actions(&everyone).is_empty());
	}

	#[test]
	fn test_get_actions() {
		let r = resolver(&[
			("*", &[Action::Info]),
			("user", &[Action::Query, Action::Feedback]),
			("auditor", &[Action::ListOthersConversations]),
		]);

		let actions = r.get_actions(&with_wildcard(&roles(&["user"])));
		let expected: BTreeSet<Action> =
			[Action::Info, Action::Query, Action::Feedback].into_iter().collect();
		assert_eq!(actions, expected);
	}
}

// vim: ts=4
