//! Authorization middleware
//!
//! `require_action()` guards a route with the authorization gate,
//! `require_action_with_quota()` additionally checks the caller's token
//! budget before the handler runs and debits the usage the handler reports.
//!
//! A handler reports usage by inserting [`TokenUsage`] into its response
//! extensions. A response without it consumes nothing.

use axum::{
	extract::{Request, State},
	middleware::Next,
	response::Response,
};
use std::pin::Pin;

use crate::prelude::*;
use tollgate_types::extract::Auth;
use tollgate_types::quota_adapter::TokenUsage;

/// Return type of the middleware closures
pub type GateOutput = Pin<Box<dyn Future<Output = ClResult<Response>> + Send>>;

/// Middleware factory checking that the caller may perform `action`
///
/// Use with `axum::middleware::from_fn_with_state(app, require_action(Action::Info))`.
pub fn require_action(action: Action) -> impl Fn(State<App>, Request, Next) -> GateOutput + Clone {
	move |state, req, next| Box::pin(guard(state, req, next, action, false))
}

/// Like [`require_action`], with token quota enforcement around the handler
pub fn require_action_with_quota(
	action: Action,
) -> impl Fn(State<App>, Request, Next) -> GateOutput + Clone {
	move |state, req, next| Box::pin(guard(state, req, next, action, true))
}

async fn guard(
	State(app): State<App>,
	mut req: Request,
	next: Next,
	action: Action,
	with_quota: bool,
) -> ClResult<Response> {
	// Guarded routes must sit behind the authentication middleware
	let Some(Auth(auth)) = req.extensions().get::<Auth>().cloned() else {
		error!(action = %action, path = %req.uri().path(), "guarded route reached without identity");
		return Err(Error::Internal(format!("no identity on route guarded by action {}", action)));
	};

	let actions = app.gate.authorize(&auth, action)?;
	req.extensions_mut().insert(actions);

	if !with_quota {
		return Ok(next.run(req).await);
	}

	app.quota.check_tokens_available(&auth.user_id).await?;

	let mut res = next.run(req).await;

	if let Some(usage) = res.extensions_mut().remove::<TokenUsage>() {
		debug!(
			user_id = %auth.user_id,
			action = %action,
			input_tokens = usage.input_tokens,
			output_tokens = usage.output_tokens,
			"debiting token usage"
		);
		app.quota.consume_tokens(&auth.user_id, &usage).await?;
	}
	Ok(res)
}

// vim: ts=4
