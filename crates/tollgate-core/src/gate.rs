//! Authorization gate
//!
//! Resolves the caller's roles, adds the wildcard role and checks the
//! requested action. On success the complete set of actions the caller may
//! perform is returned, to be attached to the request.

use crate::authz::{Resolvers, with_wildcard};
use crate::prelude::*;
use tollgate_types::auth::AuthTuple;
use tollgate_types::extract::AuthorizedActions;

#[derive(Debug, Clone)]
pub struct AuthorizationGate {
	resolvers: Resolvers,
}

impl AuthorizationGate {
	pub fn new(resolvers: Resolvers) -> Self {
		Self { resolvers }
	}

	pub fn authorize(&self, auth: &AuthTuple, action: Action) -> ClResult<AuthorizedActions> {
		let roles = with_wildcard(&self.resolvers.roles.resolve_roles(auth));

		if !self.resolvers.access.check_access(action, &roles) {
			warn!(
				subject = %auth.user_id,
				action = %action,
				roles = ?roles,
				"permission denied"
			);
			return Err(Error::PermissionDenied(action));
		}

		Ok(AuthorizedActions(self.resolvers.access.get_actions(&roles)))
	}
}


// vim: ts=4
