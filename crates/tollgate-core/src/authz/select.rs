//! Resolver selection
//!
//! Performed once at startup. Authentication modules that carry no claims,
//! and deployments without role or access rules, get the open (Noop)
//! resolvers: every caller may perform every action.

use std::sync::Arc;

use super::access::{AccessResolver, NoopAccessResolver, RuleBasedAccessResolver};
use super::roles::{JwtRoleResolver, NoopRoleResolver, RoleResolver};
use super::rules::{AccessRules, RoleRule};
use crate::config::{AuthenticationConfig, AuthorizationConfig};
use crate::prelude::*;

#[derive(Debug, Clone)]
pub struct Resolvers {
	pub roles: Arc<dyn RoleResolver>,
	pub access: Arc<dyn AccessResolver>,
}

impl Resolvers {
	/// Open resolvers: no roles, every action granted
	pub fn open() -> Self {
		Self { roles: Arc::new(NoopRoleResolver), access: Arc::new(NoopAccessResolver) }
	}

	pub fn from_config(
		authentication: &AuthenticationConfig,
		authorization: &AuthorizationConfig,
	) -> ClResult<Self> {
		// Rules are compiled even when unused so that broken configuration is never accepted
		let role_rules = RoleRule::compile_all(&authorization.role_rules)?;
		let access_rules = AccessRules::compile(&authorization.access_rules)?;
		let module = authentication.module;

		if !module.supports_role_claims() {
			if !role_rules.is_empty() || !access_rules.is_empty() {
				warn!(
					module = %module,
					"authentication module carries no claims, role and access rules are ignored; all actions are allowed"
				);
			} else {
				info!(module = %module, "authorization disabled for authentication module");
			}
			return Ok(Self::open());
		}

		if role_rules.is_empty() || access_rules.is_empty() {
			warn!(
				module = %module,
				role_rules = role_rules.len(),
				access_rules_empty = access_rules.is_empty(),
				"no role or access rules configured; all actions are allowed for every caller"
			);
			return Ok(Self::open());
		}

		info!(module = %module, role_rules = role_rules.len(), "rule based authorization enabled");
		Ok(Self {
			roles: Arc::new(JwtRoleResolver::new(role_rules)),
			access: Arc::new(RuleBasedAccessResolver::new(access_rules)),
		})
	}
}


// vim: ts=4
