use std::process::ExitCode;

use tollgate::config::{config_path, load_config};
use tollgate::prelude::*;
use tollgate::{AppBuilder, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
	init_tracing();

	let config = match load_config(&config_path()) {
		Ok(config) => config,
		Err(err) => {
			error!("FATAL: {}", err);
			return ExitCode::FAILURE;
		}
	};

	match AppBuilder::new(config).run().await {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			error!("FATAL: {}", err);
			ExitCode::FAILURE
		}
	}
}

// vim: ts=4
