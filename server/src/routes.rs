//! HTTP routes

use axum::{
	Extension, Json, Router,
	extract::State,
	http::StatusCode,
	middleware::from_fn_with_state,
	response::IntoResponse,
	routing::get,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tower_http::trace::TraceLayer;

use crate::prelude::*;
use tollgate_core::auth::authenticate;
use tollgate_core::{require_action, require_action_with_quota};
use tollgate_types::extract::{Auth, AuthorizedActions};
use tollgate_types::quota_adapter::{TokenUsage, TokenUsageRecord};

// Health //
//********//
async fn get_liveness() -> impl IntoResponse {
	Json(serde_json::json!({ "alive": true }))
}

async fn get_readiness(State(app): State<App>) -> impl IntoResponse {
	if app.quota.connected().await {
		(StatusCode::OK, Json(serde_json::json!({ "ready": true, "reason": "service is ready" })))
	} else {
		(
			StatusCode::SERVICE_UNAVAILABLE,
			Json(serde_json::json!({ "ready": false, "reason": "quota storage is not connected" })),
		)
	}
}

// Authorized //
//************//
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizedResponse {
	user_id: Box<str>,
	username: Box<str>,
	skip_user_id_check: bool,
	actions: Vec<Action>,
}

async fn get_authorized(
	Auth(auth): Auth,
	AuthorizedActions(actions): AuthorizedActions,
) -> Json<AuthorizedResponse> {
	Json(AuthorizedResponse {
		user_id: auth.user_id,
		username: auth.username,
		skip_user_id_check: auth.skip_user_id_check,
		actions: actions.into_iter().collect(),
	})
}

// Quotas //
//********//
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QuotasResponse {
	user_id: Box<str>,
	quotas: BTreeMap<Box<str>, i64>,
}

async fn get_quotas(State(app): State<App>, Auth(auth): Auth) -> ClResult<Json<QuotasResponse>> {
	let quotas = app.quota.get_available_quotas(&auth.user_id).await?;
	Ok(Json(QuotasResponse { user_id: auth.user_id, quotas }))
}

// Usage //
//*******//
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UsageResponse {
	user_id: Box<str>,
	usage: Vec<TokenUsageRecord>,
}

async fn get_usage(State(app): State<App>, Auth(auth): Auth) -> ClResult<Json<UsageResponse>> {
	let usage = app.quota.token_usage(&auth.user_id).await?;
	Ok(Json(UsageResponse { user_id: auth.user_id, usage }))
}

/// Reports `usage` as consumed by a guarded operation
async fn post_usage(Json(usage): Json<TokenUsage>) -> ClResult<impl IntoResponse> {
	usage.validate()?;
	let consumed = usage.total();
	Ok((Extension(usage), Json(serde_json::json!({ "consumed": consumed }))))
}

pub fn init(app: App) -> Router {
	let api_router = Router::new()
		.route(
			"/v1/authorized",
			get(get_authorized).layer(from_fn_with_state(app.clone(), require_action(Action::Info))),
		)
		.route(
			"/v1/quotas",
			get(get_quotas).layer(from_fn_with_state(app.clone(), require_action(Action::GetQuotas))),
		)
		.route(
			"/v1/usage",
			get(get_usage)
				.layer(from_fn_with_state(app.clone(), require_action(Action::GetQuotas)))
				.merge(
					axum::routing::post(post_usage)
						.layer(from_fn_with_state(app.clone(), require_action_with_quota(Action::Query))),
				),
		)
		.layer(from_fn_with_state(app.clone(), authenticate));

	let health_router = Router::new()
		.route("/health/liveness", get(get_liveness))
		.route("/health/readiness", get(get_readiness));

	Router::new()
		.merge(health_router)
		.merge(api_router)
		.layer(TraceLayer::new_for_http())
		.with_state(app)
}

// vim: ts=4
