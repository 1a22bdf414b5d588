// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: files, environment, CLI, defaults.

use std::path::PathBuf;

use tracing::{debug, trace, warn};

use crate::layer::*;
use crate::paths::PathsConfig;
use crate::ConfigError;

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	SystemFile = 20,
	UserFile = 30,
	Environment = 50,
	Cli = 60,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	/// Name for logging
	fn name(&self) -> &'static str;

	/// Precedence level
	fn precedence(&self) -> Precedence;

	/// Load configuration layer from this source
	fn load(&self) -> Result<ConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}
	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading defaults");
		// Defaults are applied when the runtime config is built.
		Ok(ConfigLayer::default())
	}
}

/// File-based configuration source (TOML).
pub struct FileSource {
	path: PathBuf,
	precedence: Precedence,
	name: &'static str,
}

impl FileSource {
	/// System config: /etc/taskdeck/config.toml
	pub fn system(paths: &PathsConfig) -> Self {
		Self::custom(
			paths.system_config_file.clone(),
			Precedence::SystemFile,
			"system-config",
		)
	}

	/// User config: ~/.config/taskdeck/config.toml
	pub fn user(paths: &PathsConfig) -> Self {
		Self::custom(
			paths.user_config_file.clone(),
			Precedence::UserFile,
			"user-config",
		)
	}

	/// Custom file path with specified precedence
	pub fn custom(path: PathBuf, precedence: Precedence, name: &'static str) -> Self {
		Self {
			path,
			precedence,
			name,
		}
	}
}

impl ConfigSource for FileSource {
	fn name(&self) -> &'static str {
		self.name
	}
	fn precedence(&self) -> Precedence {
		self.precedence
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), source = self.name, "config file not found, skipping");
			return Ok(ConfigLayer::default());
		}

		debug!(path = %self.path.display(), source = self.name, "loading config file");

		let content = std::fs::read_to_string(&self.path)?;
		let layer: ConfigLayer = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: self.path.clone(),
			source: e,
		})?;

		trace!(source = self.name, "parsed config layer");
		Ok(layer)
	}
}

/// Base URL variable understood for compatibility with the web build.
pub const LEGACY_BASE_URL_VAR: &str = "VITE_API_BASE_URL";

/// Environment variable source.
///
/// Convention: `TASKDECK_<FIELD>`. `TASKDECK_API_BASE_URL` wins over
/// [`LEGACY_BASE_URL_VAR`] when both are set.
pub struct EnvSource {
	vars: Vec<(String, String)>,
}

impl EnvSource {
	/// Snapshot of the process environment.
	pub fn from_env() -> Self {
		Self::from_vars(std::env::vars())
	}

	pub fn from_vars<I, K, V>(vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			vars: vars
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		}
	}
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
	match value.parse() {
		Ok(v) => Some(v),
		Err(_) => {
			warn!(key = %key, value = %value, "ignoring non-numeric environment value");
			None
		}
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}
	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading environment variables");
		let mut layer = ConfigLayer::default();
		let mut legacy_base_url = None;

		for (key, value) in &self.vars {
			let value = value.trim();
			if value.is_empty() {
				continue;
			}

			if key == LEGACY_BASE_URL_VAR {
				legacy_base_url = Some(value.to_string());
				continue;
			}
			if !key.starts_with("TASKDECK_") {
				continue;
			}

			trace!(key = %key, "processing env var");

			match key.as_str() {
				"TASKDECK_API_BASE_URL" => {
					layer.api.get_or_insert_with(ApiLayer::default).base_url = Some(value.to_string());
				}
				"TASKDECK_READ_TIMEOUT_SECS" => {
					layer
						.api
						.get_or_insert_with(ApiLayer::default)
						.read_timeout_secs = parse_number(key, value);
				}
				"TASKDECK_WRITE_TIMEOUT_SECS" => {
					layer
						.api
						.get_or_insert_with(ApiLayer::default)
						.write_timeout_secs = parse_number(key, value);
				}

				// Retry
				"TASKDECK_RETRY_MAX_ATTEMPTS" => {
					layer
						.retry
						.get_or_insert_with(RetryLayer::default)
						.max_attempts = parse_number(key, value);
				}
				"TASKDECK_RETRY_MUTATION_MAX_ATTEMPTS" => {
					layer
						.retry
						.get_or_insert_with(RetryLayer::default)
						.mutation_max_attempts = parse_number(key, value);
				}
				"TASKDECK_RETRY_BASE_DELAY_MS" => {
					layer
						.retry
						.get_or_insert_with(RetryLayer::default)
						.base_delay_ms = parse_number(key, value);
				}

				"TASKDECK_SESSION_FILE" => {
					layer.session.get_or_insert_with(SessionLayer::default).file =
						Some(PathBuf::from(value));
				}

				// Logging
				"TASKDECK_LOG_LEVEL" => {
					layer.logging.get_or_insert_with(LoggingLayer::default).level =
						Some(value.to_string());
				}
				"TASKDECK_LOG_FORMAT" => {
					layer.logging.get_or_insert_with(LoggingLayer::default).format =
						Some(value.to_string());
				}

				_ => {
					// Unknown TASKDECK_ variable, ignore
				}
			}
		}

		if let Some(url) = legacy_base_url {
			let api = layer.api.get_or_insert_with(ApiLayer::default);
			if api.base_url.is_none() {
				trace!("using legacy base URL variable");
				api.base_url = Some(url);
			}
		}

		Ok(layer)
	}
}

/// CLI override source.
pub struct CliSource {
	overrides: CliOverrides,
}

/// CLI argument overrides.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
	pub base_url: Option<String>,
	pub session_file: Option<PathBuf>,
	pub log_level: Option<String>,
	pub log_format: Option<String>,
	/// Extra config file merged above the user file.
	pub config_file: Option<PathBuf>,
}

impl CliSource {
	pub fn new(overrides: CliOverrides) -> Self {
		Self { overrides }
	}
}

impl ConfigSource for CliSource {
	fn name(&self) -> &'static str {
		"cli"
	}
	fn precedence(&self) -> Precedence {
		Precedence::Cli
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading CLI overrides");
		let mut layer = ConfigLayer::default();

		if let Some(ref base_url) = self.overrides.base_url {
			layer.api.get_or_insert_with(ApiLayer::default).base_url = Some(base_url.clone());
		}

		if let Some(ref file) = self.overrides.session_file {
			layer.session.get_or_insert_with(SessionLayer::default).file = Some(file.clone());
		}

		if let Some(ref level) = self.overrides.log_level {
			layer.logging.get_or_insert_with(LoggingLayer::default).level = Some(level.clone());
		}

		if let Some(ref format) = self.overrides.log_format {
			layer.logging.get_or_insert_with(LoggingLayer::default).format = Some(format.clone());
		}

		Ok(layer)
	}
}
