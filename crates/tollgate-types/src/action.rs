//! Action identifiers guarded by the authorization gate.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;

/// An operation a caller may be authorized to perform.
///
/// `Admin` is a superuser action: a caller granted `Admin` may perform every
/// other action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
	Admin,

	// Conversations owned by other users
	ListOthersConversations,
	ReadOthersConversations,
	QueryOthersConversations,
	DeleteOthersConversations,

	// Query endpoints
	Query,
	StreamingQuery,
	ModelOverride,

	// Own conversations
	GetConversation,
	ListConversations,
	DeleteConversation,
	UpdateConversation,
	Feedback,

	// Backend introspection
	GetModels,
	GetTools,
	GetShields,
	ListProviders,
	GetProvider,

	// Service introspection
	GetMetrics,
	GetConfig,
	GetQuotas,
	Info,
}

impl Action {
	/// Every action known to the gateway.
	pub const ALL: &'static [Action] = &[
		Action::Admin,
		Action::ListOthersConversations,
		Action::ReadOthersConversations,
		Action::QueryOthersConversations,
		Action::DeleteOthersConversations,
		Action::Query,
		Action::StreamingQuery,
		Action::ModelOverride,
		Action::GetConversation,
		Action::ListConversations,
		Action::DeleteConversation,
		Action::UpdateConversation,
		Action::Feedback,
		Action::GetModels,
		Action::GetTools,
		Action::GetShields,
		Action::ListProviders,
		Action::GetProvider,
		Action::GetMetrics,
		Action::GetConfig,
		Action::GetQuotas,
		Action::Info,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Action::Admin => "admin",
			Action::ListOthersConversations => "list_others_conversations",
			Action::ReadOthersConversations => "read_others_conversations",
			Action::QueryOthersConversations => "query_others_conversations",
			Action::DeleteOthersConversations => "delete_others_conversations",
			Action::Query => "query",
			Action::StreamingQuery => "streaming_query",
			Action::ModelOverride => "model_override",
			Action::GetConversation => "get_conversation",
			Action::ListConversations => "list_conversations",
			Action::DeleteConversation => "delete_conversation",
			Action::UpdateConversation => "update_conversation",
			Action::Feedback => "feedback",
			Action::GetModels => "get_models",
			Action::GetTools => "get_tools",
			Action::GetShields => "get_shields",
			Action::ListProviders => "list_providers",
			Action::GetProvider => "get_provider",
			Action::GetMetrics => "get_metrics",
			Action::GetConfig => "get_config",
			Action::GetQuotas => "get_quotas",
			Action::Info => "info",
		}
	}
}

impl std::fmt::Display for Action {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Action {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Action::ALL
			.iter()
			.find(|action| action.as_str().eq_ignore_ascii_case(s))
			.copied()
			.ok_or_else(|| Error::ValidationError(format!("unknown action: {}", s)))
	}
}

// Names are accepted case-insensitively, so `QUERY` and `query` both work in config files
impl<'de> Deserialize<'de> for Action {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let name = String::deserialize(deserializer)?;
		name.parse().map_err(serde::de::Error::custom)
	}
}


// vim: ts=4
