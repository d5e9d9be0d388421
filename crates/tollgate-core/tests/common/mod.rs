#![allow(dead_code)]

use axum::{
	Extension, Json, Router,
	body::Body,
	http::{Request, StatusCode, header},
	middleware::from_fn_with_state,
	response::IntoResponse,
	routing::{get, post},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use http_body_util::BodyExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tempfile::TempDir;
use tower::ServiceExt;

use tollgate_core::auth::{NoopWithTokenAuthenticator, authenticate};
use tollgate_core::authz::Resolvers;
use tollgate_core::config::Config;
use tollgate_core::quota::{Clock, QuotaLimiterRegistry};
use tollgate_core::{App, AppState, AuthorizationGate, require_action, require_action_with_quota};
use tollgate_quota_adapter_sql::SqlConnector;
use tollgate_types::action::Action;
use tollgate_types::extract::{Auth, AuthorizedActions};
use tollgate_types::quota_adapter::{DatabaseConfig, SqliteConfig, TokenUsage};
use tollgate_types::types::Timestamp;

/// Settable clock shared with the quota limiters
#[derive(Clone)]
pub struct TestClock(Arc<AtomicI64>);

impl TestClock {
	pub fn new(secs: i64) -> Self {
		Self(Arc::new(AtomicI64::new(secs)))
	}

	pub fn advance(&self, secs: i64) {
		self.0.fetch_add(secs, Ordering::SeqCst);
	}

	pub fn clock(&self) -> Clock {
		let now = self.0.clone();
		Arc::new(move || Timestamp(now.load(Ordering::SeqCst)))
	}
}

pub struct TestApp {
	pub app: App,
	pub clock: TestClock,
	_temp: TempDir,
}

/// Builds an app from a JSON config; the sqlite database lives in a temp dir
pub async fn create_test_app(mut config: serde_json::Value) -> TestApp {
	let temp = TempDir::new().expect("Failed to create temp directory");
	let db_path = temp.path().join("quota.db").to_string_lossy().into_owned();
	config["quota_handlers"]["sqlite"] = serde_json::json!({ "db_path": db_path });

	let config: Config = serde_json::from_value(config).expect("invalid test config");
	config.validate().expect("test config rejected");

	let clock = TestClock::new(1_000_000);
	let connector = SqlConnector::new(DatabaseConfig::Sqlite(SqliteConfig { db_path: db_path.into() }));
	let quota = QuotaLimiterRegistry::build(&config.quota_handlers, &connector)
		.await
		.expect("Failed to build quota registry")
		.with_clock(&clock.clock());
	let resolvers = Resolvers::from_config(&config.authentication, &config.authorization)
		.expect("Failed to select resolvers");

	let app = Arc::new(AppState {
		authenticator: Arc::new(NoopWithTokenAuthenticator::default()),
		gate: AuthorizationGate::new(resolvers),
		quota: Arc::new(quota),
		config,
	});
	TestApp { app, clock, _temp: temp }
}

async fn whoami(Auth(auth): Auth, AuthorizedActions(actions): AuthorizedActions) -> impl IntoResponse {
	let actions: Vec<String> = actions.iter().map(ToString::to_string).collect();
	Json(serde_json::json!({ "userId": auth.user_id, "actions": actions }))
}

async fn config_handler() -> impl IntoResponse {
	Json(serde_json::json!({ "ok": true }))
}

async fn query(Json(usage): Json<TokenUsage>) -> impl IntoResponse {
	(Extension(usage), Json(serde_json::json!({ "answer": 42 })))
}

async fn failing_query() -> impl IntoResponse {
	StatusCode::BAD_GATEWAY
}

/// Upstream failed after part of the work was already billed
async fn partially_failing_query() -> impl IntoResponse {
	(StatusCode::BAD_GATEWAY, Extension(TokenUsage::new(10, 5)))
}

pub fn router(app: &App) -> Router {
	Router::new()
		.route("/info", get(whoami).layer(from_fn_with_state(app.clone(), require_action(Action::Info))))
		.route(
			"/config",
			get(config_handler).layer(from_fn_with_state(app.clone(), require_action(Action::GetConfig))),
		)
		.route(
			"/query",
			post(query).layer(from_fn_with_state(app.clone(), require_action_with_quota(Action::Query))),
		)
		.route(
			"/failing",
			post(failing_query)
				.layer(from_fn_with_state(app.clone(), require_action_with_quota(Action::Query))),
		)
		.route(
			"/failing_partial",
			post(partially_failing_query)
				.layer(from_fn_with_state(app.clone(), require_action_with_quota(Action::Query))),
		)
		.layer(from_fn_with_state(app.clone(), authenticate))
		.with_state(app.clone())
}

/// Unsigned JWT carrying `claims`
pub fn jwt(claims: &serde_json::Value) -> String {
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
	let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
	format!("{}.{}.sig", header, payload)
}

pub async fn send(
	router: &Router,
	method: &str,
	uri: &str,
	token: Option<&str>,
	body: Option<serde_json::Value>,
) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
	let mut req = Request::builder().method(method).uri(uri);
	if let Some(token) = token {
		req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
	}
	let req = match body {
		Some(body) => req
			.header(header::CONTENT_TYPE, "application/json")
			.body(Body::from(body.to_string()))
			.unwrap(),
		None => req.body(Body::empty()).unwrap(),
	};

	let res = router.clone().oneshot(req).await.unwrap();
	let status = res.status();
	let headers = res.headers().clone();
	let bytes = res.into_body().collect().await.unwrap().to_bytes();
	let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
	(status, headers, json)
}

// vim: ts=4
