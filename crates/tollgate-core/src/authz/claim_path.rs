//! Claim path evaluation
//!
//! Role rules address values inside the (arbitrarily nested) claim payload
//! with JSONPath expressions such as `$.realm_access.roles[*]`.

use serde_json::Value;
use serde_json_path::JsonPath;

use crate::prelude::*;

/// A compiled JSONPath expression
#[derive(Debug, Clone)]
pub struct ClaimPath {
	expr: Box<str>,
	path: JsonPath,
}

impl ClaimPath {
	pub fn parse(expr: &str) -> ClResult<Self> {
		let path = JsonPath::parse(expr)
			.map_err(|err| Error::ConfigError(format!("invalid claim path '{}': {}", expr, err)))?;
		Ok(Self { expr: expr.into(), path })
	}

	pub fn as_str(&self) -> &str {
		&self.expr
	}

	/// Every node the path resolves to, in document order. Empty when nothing matches.
	pub fn evaluate<'a>(&self, claims: &'a Value) -> Vec<&'a Value> {
		self.path.query(claims).all()
	}
}


// vim: ts=4
