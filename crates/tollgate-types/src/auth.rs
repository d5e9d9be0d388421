//! Caller identity as produced by an authentication module.
//!
//! Credential verification happens in the [`Authenticator`] implementation;
//! everything downstream only consumes the resulting [`AuthTuple`].

use async_trait::async_trait;
use axum::http::request::Parts;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use std::borrow::Cow;
use std::fmt::Debug;

use crate::prelude::*;

/// User id reported when the authentication module does not identify users
pub const DEFAULT_USER_ID: &str = "00000000-0000-0000-0000-000000000000";
pub const DEFAULT_USERNAME: &str = "tollgate-user";

/// Identity of an authenticated caller
#[derive(Clone, Debug)]
pub struct AuthTuple {
	pub user_id: Box<str>,
	pub username: Box<str>,
	pub skip_user_id_check: bool,
	/// Raw bearer token, if the authentication module carries one
	pub token: Option<Box<str>>,
	/// Pre-decoded claims; take precedence over the token payload
	pub claims: Option<serde_json::Value>,
}

impl AuthTuple {
	pub fn new(user_id: impl Into<Box<str>>, username: impl Into<Box<str>>) -> Self {
		Self {
			user_id: user_id.into(),
			username: username.into(),
			skip_user_id_check: false,
			token: None,
			claims: None,
		}
	}

	pub fn with_token(mut self, token: impl Into<Box<str>>) -> Self {
		self.token = Some(token.into());
		self
	}

	pub fn with_claims(mut self, claims: serde_json::Value) -> Self {
		self.claims = Some(claims);
		self
	}

	/// Claim payload of the identity.
	///
	/// Never fails: a missing or undecodable token yields an empty object.
	pub fn claims(&self) -> Cow<'_, serde_json::Value> {
		if let Some(claims) = &self.claims {
			return Cow::Borrowed(claims);
		}
		let decoded = self.token.as_deref().and_then(decode_jwt_payload);
		Cow::Owned(decoded.unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new())))
	}
}

/// Decodes the payload segment of a JWT without verifying its signature
fn decode_jwt_payload(token: &str) -> Option<serde_json::Value> {
	let mut segments = token.split('.');
	let (_header, payload) = (segments.next()?, segments.next()?);
	segments.next()?;

	let bytes = URL_SAFE_NO_PAD
		.decode(payload.trim_end_matches('='))
		.inspect_err(|err| debug!("JWT payload is not base64url: {}", err))
		.ok()?;
	serde_json::from_slice(&bytes)
		.inspect_err(|err| debug!("JWT payload is not JSON: {}", err))
		.ok()
}

/// Produces an identity tuple from an incoming request
#[async_trait]
pub trait Authenticator: Debug + Send + Sync {
	/// Name of the authentication module, used in logs
	fn name(&self) -> &'static str;

	async fn authenticate(&self, parts: &Parts) -> ClResult<AuthTuple>;
}


// vim: ts=4
