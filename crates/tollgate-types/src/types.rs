//! Common types used throughout the gateway.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

// Timestamp //
//***********//
/// Wall-clock time in whole seconds since the Unix epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
	pub fn now() -> Timestamp {
		let res = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
		Timestamp(res.as_secs() as i64)
	}

	/// Returns the timestamp `period` before this one.
	pub fn saturating_sub(self, period: Duration) -> Timestamp {
		let secs = i64::try_from(period.as_secs()).unwrap_or(i64::MAX);
		Timestamp(self.0.saturating_sub(secs))
	}

	/// Returns the timestamp `period` after this one.
	pub fn saturating_add(self, period: Duration) -> Timestamp {
		let secs = i64::try_from(period.as_secs()).unwrap_or(i64::MAX);
		Timestamp(self.0.saturating_add(secs))
	}

	/// RFC 3339 representation, used in JSON responses.
	pub fn to_iso(self) -> String {
		chrono::DateTime::from_timestamp(self.0, 0)
			.map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
			.unwrap_or_default()
	}
}

impl std::fmt::Display for Timestamp {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl Serialize for Timestamp {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_i64(self.0)
	}
}

impl<'de> Deserialize<'de> for Timestamp {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		Ok(Timestamp(i64::deserialize(deserializer)?))
	}
}

/// Serialize a timestamp as an ISO string
pub fn serialize_timestamp_iso<S>(ts: &Timestamp, s: S) -> Result<S::Ok, S::Error>
where
	S: serde::Serializer,
{
	s.serialize_str(&ts.to_iso())
}


// vim: ts=4
