//! Role resolvers

use std::fmt::Debug;

use super::RoleSet;
use super::rules::RoleRule;
use crate::prelude::*;
use tollgate_types::auth::AuthTuple;

/// Maps an identity to the set of roles it holds.
///
/// Resolution never fails: rules that cannot be evaluated against the
/// identity's claims simply do not match. The wildcard role is not part of
/// the result, the authorization gate adds it.
pub trait RoleResolver: Debug + Send + Sync {
	fn resolve_roles(&self, auth: &AuthTuple) -> RoleSet;
}

/// Resolver for authentication modules that carry no claims
#[derive(Debug, Default)]
pub struct NoopRoleResolver;

impl RoleResolver for NoopRoleResolver {
	fn resolve_roles(&self, _auth: &AuthTuple) -> RoleSet {
		RoleSet::new()
	}
}

/// Evaluates role rules against the JWT claims of the identity
#[derive(Debug)]
pub struct JwtRoleResolver {
	rules: Vec<RoleRule>,
}

impl JwtRoleResolver {
	pub fn new(rules: Vec<RoleRule>) -> Self {
		Self { rules }
	}
}

impl RoleResolver for JwtRoleResolver {
	fn resolve_roles(&self, auth: &AuthTuple) -> RoleSet {
		let claims = auth.claims();
		let roles: RoleSet = self
			.rules
			.iter()
			.filter(|rule| rule.matches(&claims))
			.flat_map(|rule| rule.roles().iter().cloned())
			.collect();
		debug!(user_id = %auth.user_id, roles = ?roles, "resolved roles");
		roles
	}
}


// vim: ts=4
