//! Configuration file loading

use std::path::{Path, PathBuf};

use crate::prelude::*;
use tollgate_core::config::Config;

pub const CONFIG_ENV: &str = "TOLLGATE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "./tollgate.yaml";

/// Path of the configuration file, from `TOLLGATE_CONFIG` or the default
pub fn config_path() -> PathBuf {
	std::env::var_os(CONFIG_ENV).map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Parses and validates a YAML configuration
pub fn parse_config(yaml: &str) -> ClResult<Config> {
	let config: Config = serde_yaml::from_str(yaml)
		.map_err(|err| Error::ConfigError(format!("cannot parse configuration: {}", err)))?;
	config.validate()?;
	Ok(config)
}

pub fn load_config(path: &Path) -> ClResult<Config> {
	let yaml = std::fs::read_to_string(path).map_err(|err| {
		Error::ConfigError(format!("cannot read configuration file {}: {}", path.display(), err))
	})?;
	let config = parse_config(&yaml)?;
	info!(path = %path.display(), "configuration loaded");
	Ok(config)
}


// vim: ts=4
