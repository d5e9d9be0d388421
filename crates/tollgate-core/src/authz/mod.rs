//! Role and access resolution
//!
//! Turns a caller identity into a role set ([`RoleResolver`]) and a role set
//! into permitted actions ([`AccessResolver`]). Both are selected once at
//! startup from configuration, see [`Resolvers::from_config`].

pub mod access;
pub mod claim_path;
pub mod roles;
pub mod rules;
pub mod select;

use std::collections::BTreeSet;

pub use access::{AccessResolver, NoopAccessResolver, RuleBasedAccessResolver};
pub use claim_path::ClaimPath;
pub use roles::{JwtRoleResolver, NoopRoleResolver, RoleResolver};
pub use rules::{AccessRules, RoleRule};
pub use select::Resolvers;

/// Role every caller implicitly has
pub const WILDCARD_ROLE: &str = "*";

/// A resolved set of roles
pub type RoleSet = BTreeSet<Box<str>>;

/// Returns `roles` extended with the wildcard role
pub fn with_wildcard(roles: &RoleSet) -> RoleSet {
	let mut roles = roles.clone();
	roles.insert(WILDCARD_ROLE.into());
	roles
}

// vim: ts=4
