//! App state type

use std::sync::Arc;

use crate::config::Config;
use crate::gate::AuthorizationGate;
use crate::quota::QuotaLimiterRegistry;
use tollgate_types::auth::Authenticator;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct AppState {
	pub config: Config,
	pub authenticator: Arc<dyn Authenticator>,
	pub gate: AuthorizationGate,
	pub quota: Arc<QuotaLimiterRegistry>,
}

pub type App = Arc<AppState>;

// vim: ts=4
