//! Custom Axum extractors for gateway-specific request data.
//!
//! Both values are placed into the request extensions by middleware: [`Auth`]
//! by the authentication layer, [`AuthorizedActions`] by the authorization gate.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::collections::BTreeSet;

use crate::action::Action;
use crate::auth::AuthTuple;
use crate::error::Error;

// Auth //
//******//
#[derive(Debug, Clone)]
pub struct Auth(pub AuthTuple);

impl<S> FromRequestParts<S> for Auth
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		if let Some(auth) = parts.extensions.get::<Auth>().cloned() {
			Ok(auth)
		} else {
			Err(Error::Unauthorized)
		}
	}
}

// AuthorizedActions //
//*******************//
/// Every action the current caller may perform, computed once per request
/// by the authorization gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizedActions(pub BTreeSet<Action>);

impl AuthorizedActions {
	pub fn contains(&self, action: Action) -> bool {
		self.0.contains(&action)
	}
}

impl<S> FromRequestParts<S> for AuthorizedActions
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		// Only present on routes behind the authorization gate
		parts.extensions.get::<AuthorizedActions>().cloned().ok_or_else(|| {
			Error::Internal("authorized actions requested on an unguarded route".into())
		})
	}
}

// vim: ts=4
