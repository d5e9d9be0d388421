//! Built-in authenticators and the authentication middleware
//!
//! Credential verification for the `k8s` and `jwk-token` modules is provided
//! by the embedding application.

use async_trait::async_trait;
use axum::{
	extract::{Query, Request, State},
	http::{header, request::Parts},
	middleware::Next,
	response::Response,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::config::{AuthModule, AuthenticationConfig};
use crate::prelude::*;
use tollgate_types::auth::{AuthTuple, Authenticator, DEFAULT_USER_ID, DEFAULT_USERNAME};
use tollgate_types::extract::Auth;

#[derive(Deserialize)]
struct UserIdQuery {
	user_id: Option<String>,
}

/// Identity for the noop modules: the default user, or `?user_id=`
fn noop_identity(parts: &Parts, skip_user_id_check: bool) -> AuthTuple {
	let user_id = Query::<UserIdQuery>::try_from_uri(&parts.uri)
		.ok()
		.and_then(|Query(q)| q.user_id)
		.filter(|id| !id.trim().is_empty());

	let mut auth = match user_id {
		Some(user_id) => AuthTuple::new(user_id, DEFAULT_USERNAME),
		None => AuthTuple::new(DEFAULT_USER_ID, DEFAULT_USERNAME),
	};
	auth.skip_user_id_check = skip_user_id_check;
	auth
}

/// Accepts every request as the default user
#[derive(Debug, Default)]
pub struct NoopAuthenticator {
	pub skip_user_id_check: bool,
}

#[async_trait]
impl Authenticator for NoopAuthenticator {
	fn name(&self) -> &'static str {
		AuthModule::Noop.as_str()
	}

	async fn authenticate(&self, parts: &Parts) -> ClResult<AuthTuple> {
		Ok(noop_identity(parts, self.skip_user_id_check))
	}
}

/// Like [`NoopAuthenticator`], but requires a bearer token and passes it on unverified
#[derive(Debug, Default)]
pub struct NoopWithTokenAuthenticator {
	pub skip_user_id_check: bool,
}

#[async_trait]
impl Authenticator for NoopWithTokenAuthenticator {
	fn name(&self) -> &'static str {
		AuthModule::NoopWithToken.as_str()
	}

	async fn authenticate(&self, parts: &Parts) -> ClResult<AuthTuple> {
		let token = bearer_token(parts).ok_or(Error::Unauthorized)?;
		Ok(noop_identity(parts, self.skip_user_id_check).with_token(token))
	}
}

/// Token of an `Authorization: Bearer` header
pub fn bearer_token(parts: &Parts) -> Option<&str> {
	let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
	let token = value.strip_prefix("Bearer ")?.trim();
	(!token.is_empty()).then_some(token)
}

/// Selects the authenticator for the configured module.
///
/// The noop modules are built in; every other module needs `external`.
pub fn authenticator_for(
	config: &AuthenticationConfig,
	external: Option<Arc<dyn Authenticator>>,
) -> ClResult<Arc<dyn Authenticator>> {
	let skip_user_id_check = config.skip_user_id_check;
	match (config.module, external) {
		(AuthModule::Noop | AuthModule::NoopWithToken, Some(external)) => {
			warn!(module = %config.module, external = external.name(), "external authenticator overrides built-in module");
			Ok(external)
		}
		(AuthModule::Noop, None) => Ok(Arc::new(NoopAuthenticator { skip_user_id_check })),
		(AuthModule::NoopWithToken, None) => {
			Ok(Arc::new(NoopWithTokenAuthenticator { skip_user_id_check }))
		}
		(AuthModule::K8s | AuthModule::JwkToken, Some(external)) => Ok(external),
		(module @ (AuthModule::K8s | AuthModule::JwkToken), None) => Err(Error::ConfigError(
			format!("authentication module '{}' requires an external authenticator", module),
		)),
	}
}

/// Middleware placing the caller identity into the request extensions
pub async fn authenticate(State(app): State<App>, req: Request, next: Next) -> ClResult<Response> {
	let (mut parts, body) = req.into_parts();
	let auth = app.authenticator.authenticate(&parts).await.inspect_err(|err| {
		debug!(module = app.authenticator.name(), error = %err, "authentication failed");
	})?;
	parts.extensions.insert(Auth(auth));

	Ok(next.run(Request::from_parts(parts, body)).await)
}


// vim: ts=4
