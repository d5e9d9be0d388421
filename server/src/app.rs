//! App builder - constructs and runs the Tollgate service

use std::sync::Arc;

use crate::prelude::*;
use crate::routes;
pub use tollgate_core::app::{App, AppState, VERSION};
use tollgate_core::auth::authenticator_for;
use tollgate_core::authz::Resolvers;
use tollgate_core::config::Config;
use tollgate_core::gate::AuthorizationGate;
use tollgate_core::quota::{QuotaLimiterRegistry, scheduler::spawn_quota_scheduler};
use tollgate_quota_adapter_sql::SqlConnector;
use tollgate_types::auth::Authenticator;
use tollgate_types::quota_adapter::QuotaAdapterFactory;

/// Initializes the global tracing subscriber from `RUST_LOG`
pub fn init_tracing() {
	let res = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_target(false)
		.try_init();
	if res.is_err() {
		debug!("tracing subscriber already installed");
	}
}

pub struct AppBuilder {
	config: Config,
	authenticator: Option<Arc<dyn Authenticator>>,
	quota_adapter_factory: Option<Arc<dyn QuotaAdapterFactory>>,
}

impl AppBuilder {
	pub fn new(config: Config) -> Self {
		AppBuilder { config, authenticator: None, quota_adapter_factory: None }
	}

	/// Authenticator for the `k8s` and `jwk-token` modules
	pub fn authenticator(&mut self, authenticator: Arc<dyn Authenticator>) -> &mut Self {
		self.authenticator = Some(authenticator);
		self
	}

	/// Replaces the SQL storage configured in `quota_handlers`
	pub fn quota_adapter_factory(&mut self, factory: Arc<dyn QuotaAdapterFactory>) -> &mut Self {
		self.quota_adapter_factory = Some(factory);
		self
	}

	pub async fn build(self) -> ClResult<App> {
		let config = self.config;
		config.validate().inspect_err(|err| error!("FATAL: {}", err))?;

		let authenticator = authenticator_for(&config.authentication, self.authenticator)
			.inspect_err(|err| error!("FATAL: {}", err))?;
		info!(module = authenticator.name(), "authentication module ready");

		let resolvers = Resolvers::from_config(&config.authentication, &config.authorization)?;

		let factory: Option<Arc<dyn QuotaAdapterFactory>> = match self.quota_adapter_factory {
			Some(factory) => Some(factory),
			None => config
				.quota_handlers
				.database()?
				.map(|db| Arc::new(SqlConnector::new(db)) as Arc<dyn QuotaAdapterFactory>),
		};
		let quota = match factory {
			Some(factory) if config.quota_handlers.needs_storage() => {
				QuotaLimiterRegistry::build(&config.quota_handlers, factory.as_ref())
					.await
					.inspect_err(|err| error!("FATAL: cannot set up quota storage: {}", err))?
			}
			_ => QuotaLimiterRegistry::empty(),
		};

		Ok(Arc::new(AppState {
			authenticator,
			gate: AuthorizationGate::new(resolvers),
			quota: Arc::new(quota),
			config,
		}))
	}

	pub async fn run(self) -> ClResult<()> {
		info!("Tollgate V{}", VERSION);

		let app = self.build().await?;

		let scheduler = if app.quota.is_empty() {
			None
		} else {
			let period = app.config.quota_handlers.scheduler_period()?;
			Some(spawn_quota_scheduler(app.quota.clone(), period))
		};

		let router = routes::init(app.clone());
		let listener = tokio::net::TcpListener::bind(app.config.service.listen.as_ref())
			.await
			.map_err(|err| {
				error!("FATAL: cannot listen on {}: {}", app.config.service.listen, err);
				Error::ServiceUnavailable(format!("cannot listen on {}", app.config.service.listen))
			})?;
		info!("Listening on HTTP {}", app.config.service.listen);

		let res = axum::serve(listener, router)
			.with_graceful_shutdown(shutdown_signal())
			.await
			.map_err(|err| Error::Internal(format!("server error: {}", err)));

		if let Some(scheduler) = scheduler {
			scheduler.abort();
		}
		info!("Tollgate stopped");
		res
	}
}

async fn shutdown_signal() {
	if let Err(err) = tokio::signal::ctrl_c().await {
		warn!("cannot listen for shutdown signal: {}", err);
		std::future::pending::<()>().await;
	}
	info!("shutdown requested");
}

// vim: ts=4
