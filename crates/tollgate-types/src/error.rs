//! Error type shared by every gateway crate.
//!
//! Errors that reach a request boundary are rendered as
//! `{"error": {"code": ..., "message": ..., "details": ...}}` JSON bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use crate::action::Action;
use crate::quota_adapter::SubjectType;

pub type ClResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	NotFound,
	/// No usable identity could be produced for the request
	Unauthorized,
	/// The caller's roles do not permit the requested action
	PermissionDenied(Action),
	/// The subject has no token budget left in one of the limiters
	QuotaExceeded {
		limiter: Box<str>,
		subject_type: SubjectType,
		subject_id: Box<str>,
		available: i64,
		/// Length of the limiter's replenishment window in seconds
		retry_after: Option<u64>,
	},
	/// Quota storage query failed
	DbError,
	ServiceUnavailable(String),
	/// Invalid configuration, fatal at startup
	ConfigError(String),
	ValidationError(String),
	Internal(String),
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Error::NotFound => write!(f, "not found"),
			Error::Unauthorized => write!(f, "unauthorized"),
			Error::PermissionDenied(action) => {
				write!(f, "permission denied for action {}", action)
			}
			Error::QuotaExceeded { limiter, subject_type, subject_id, available, .. } => {
				write!(
					f,
					"quota exceeded in {} for {} '{}' (available: {})",
					limiter, subject_type, subject_id, available
				)
			}
			Error::DbError => write!(f, "quota storage error"),
			Error::ServiceUnavailable(msg) => write!(f, "service unavailable: {}", msg),
			Error::ConfigError(msg) => write!(f, "configuration error: {}", msg),
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
		}
	}
}

impl std::error::Error for Error {}

fn error_body(code: &str, message: &str, details: Option<serde_json::Value>) -> serde_json::Value {
	let mut error = serde_json::json!({
		"code": code,
		"message": message,
	});
	if let (Some(details), Some(obj)) = (details, error.as_object_mut()) {
		obj.insert("details".into(), details);
	}
	serde_json::json!({ "error": error })
}

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		match self {
			Error::NotFound => {
				(StatusCode::NOT_FOUND, Json(error_body("E-CORE-NOTFOUND", "Not found", None)))
					.into_response()
			}
			Error::Unauthorized => (
				StatusCode::UNAUTHORIZED,
				Json(error_body("E-AUTH-UNAUTH", "Missing or invalid credentials", None)),
			)
				.into_response(),
			Error::PermissionDenied(action) => {
				let details = serde_json::json!({ "action": action });
				(
					StatusCode::FORBIDDEN,
					Json(error_body(
						"E-AUTH-FORBIDDEN",
						"User is not authorized to perform this action",
						Some(details),
					)),
				)
					.into_response()
			}
			Error::QuotaExceeded { limiter, subject_type, subject_id, available, retry_after } => {
				let details = serde_json::json!({
					"limiter": limiter,
					"subject": subject_type.as_char().to_string(),
					"subjectId": subject_id,
					"available": available,
					"retryAfter": retry_after,
				});
				let mut response = (
					StatusCode::TOO_MANY_REQUESTS,
					Json(error_body("E-QUOTA-EXCEEDED", "The token quota has been exceeded", Some(details))),
				)
					.into_response();

				if let Some(val) = retry_after.and_then(|secs| secs.to_string().parse().ok()) {
					response.headers_mut().insert("Retry-After", val);
				}
				response
			}
			Error::DbError | Error::ServiceUnavailable(_) => (
				StatusCode::SERVICE_UNAVAILABLE,
				Json(error_body("E-CORE-UNAVAILABLE", "Quota backend is unavailable", None)),
			)
				.into_response(),
			Error::ValidationError(msg) => (
				StatusCode::BAD_REQUEST,
				Json(error_body("E-CORE-VALIDATION", &msg, None)),
			)
				.into_response(),
			Error::ConfigError(_) | Error::Internal(_) => {
				error!("{}", self);
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					Json(error_body("E-CORE-INTERNAL", "Internal server error", None)),
				)
					.into_response()
			}
		}
	}
}


// vim: ts=4
