// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Runtime configuration types with resolved defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::layer::*;
use crate::paths::PathsConfig;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5001/api";
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_MUTATION_MAX_ATTEMPTS: u32 = 2;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_SESSION_LIFETIME: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// The final, validated configuration for Taskdeck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskdeckConfig {
	pub api: ApiConfig,
	pub retry: RetryConfig,
	pub session: SessionConfig,
	pub logging: LoggingConfig,

	/// Resolved XDG paths (not serialized)
	#[serde(skip)]
	pub paths: Option<PathsConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
	pub base_url: String,
	#[serde(with = "duration_secs")]
	pub read_timeout: Duration,
	#[serde(with = "duration_secs")]
	pub write_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
	/// Attempts for `GET`/`DELETE`.
	pub max_attempts: u32,
	/// Attempts for `POST`/`PUT`.
	pub mutation_max_attempts: u32,
	#[serde(with = "duration_millis")]
	pub base_delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
	pub file: PathBuf,
	#[serde(with = "duration_secs")]
	pub lifetime: Duration,
	/// Use the OS keychain as the primary backend when available.
	pub keyring: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
	pub level: LogLevel,
	pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
	Error,
	Warn,
	#[default]
	Info,
	Debug,
	Trace,
}

impl LogLevel {
	pub fn as_str(self) -> &'static str {
		match self {
			LogLevel::Error => "error",
			LogLevel::Warn => "warn",
			LogLevel::Info => "info",
			LogLevel::Debug => "debug",
			LogLevel::Trace => "trace",
		}
	}
}

impl FromStr for LogLevel {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"error" => Ok(LogLevel::Error),
			"warn" | "warning" => Ok(LogLevel::Warn),
			"info" => Ok(LogLevel::Info),
			"debug" => Ok(LogLevel::Debug),
			"trace" => Ok(LogLevel::Trace),
			other => Err(format!("unknown log level '{other}'")),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	#[default]
	Pretty,
	Json,
	Compact,
}

impl FromStr for LogFormat {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"pretty" => Ok(LogFormat::Pretty),
			"json" => Ok(LogFormat::Json),
			"compact" => Ok(LogFormat::Compact),
			other => Err(format!("unknown log format '{other}'")),
		}
	}
}

mod duration_secs {
	use serde::{Deserialize, Deserializer, Serializer};
	use std::time::Duration;

	pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_u64(duration.as_secs())
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
		Ok(Duration::from_secs(u64::deserialize(deserializer)?))
	}
}

mod duration_millis {
	use serde::{Deserialize, Deserializer, Serializer};
	use std::time::Duration;

	pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_u64(duration.as_millis() as u64)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
		Ok(Duration::from_millis(u64::deserialize(deserializer)?))
	}
}

/// Unparseable level and format strings are kept so validation can report
/// them instead of silently falling back.
#[derive(Debug, Clone, Default)]
pub(crate) struct Unresolved {
	pub log_level: Option<String>,
	pub log_format: Option<String>,
}

impl TaskdeckConfig {
	/// Build runtime config from a merged layer and paths.
	pub fn from_layer(layer: ConfigLayer, paths: PathsConfig) -> Self {
		Self::resolve(layer, Some(paths)).0
	}

	pub(crate) fn resolve(layer: ConfigLayer, paths: Option<PathsConfig>) -> (Self, Unresolved) {
		let api = layer.api.unwrap_or_default();
		let retry = layer.retry.unwrap_or_default();
		let session = layer.session.unwrap_or_default();
		let logging = layer.logging.unwrap_or_default();
		let mut unresolved = Unresolved::default();

		let level = match logging.level.as_deref().map(str::parse::<LogLevel>) {
			Some(Ok(level)) => level,
			Some(Err(_)) => {
				unresolved.log_level = logging.level.clone();
				LogLevel::default()
			}
			None => LogLevel::default(),
		};
		let format = match logging.format.as_deref().map(str::parse::<LogFormat>) {
			Some(Ok(format)) => format,
			Some(Err(_)) => {
				unresolved.log_format = logging.format.clone();
				LogFormat::default()
			}
			None => LogFormat::default(),
		};

		let session_file = session.file.unwrap_or_else(|| match &paths {
			Some(paths) => paths.session_file(),
			None => PathBuf::from("session.json"),
		});

		let config = Self {
			api: ApiConfig {
				base_url: api
					.base_url
					.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
				read_timeout: api
					.read_timeout_secs
					.map(Duration::from_secs)
					.unwrap_or(DEFAULT_READ_TIMEOUT),
				write_timeout: api
					.write_timeout_secs
					.map(Duration::from_secs)
					.unwrap_or(DEFAULT_WRITE_TIMEOUT),
			},
			retry: RetryConfig {
				max_attempts: retry.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
				mutation_max_attempts: retry
					.mutation_max_attempts
					.unwrap_or(DEFAULT_MUTATION_MAX_ATTEMPTS),
				base_delay: retry
					.base_delay_ms
					.map(Duration::from_millis)
					.unwrap_or(DEFAULT_BASE_DELAY),
			},
			session: SessionConfig {
				file: session_file,
				lifetime: session
					.lifetime_secs
					.map(Duration::from_secs)
					.unwrap_or(DEFAULT_SESSION_LIFETIME),
				keyring: session.keyring.unwrap_or(false),
			},
			logging: LoggingConfig { level, format },
			paths,
		};
		(config, unresolved)
	}
}

impl Default for TaskdeckConfig {
	fn default() -> Self {
		Self::resolve(ConfigLayer::default(), None).0
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::Path;

	#[test]
	fn test_defaults() {
		let paths = PathsConfig::under(Path::new("/cfg"), Path::new("/data"));
		let config = TaskdeckConfig::from_layer(ConfigLayer::default(), paths);

		assert_eq!(config.api.base_url, "http://localhost:5001/api");
		assert_eq!(config.api.read_timeout, Duration::from_secs(10));
		assert_eq!(config.api.write_timeout, Duration::from_secs(15));
		assert_eq!(config.retry.max_attempts, 3);
		assert_eq!(config.retry.mutation_max_attempts, 2);
		assert_eq!(config.retry.base_delay, Duration::from_millis(1000));
		assert_eq!(config.session.lifetime, Duration::from_secs(604_800));
		assert_eq!(config.session.file, PathBuf::from("/data/taskdeck/session.json"));
		assert!(!config.session.keyring);
		assert_eq!(config.logging.level, LogLevel::Info);
		assert_eq!(config.logging.format, LogFormat::Pretty);
	}

	#[test]
	fn test_layer_values_override_defaults() {
		let layer = ConfigLayer {
			retry: Some(RetryLayer {
				base_delay_ms: Some(50),
				..Default::default()
			}),
			logging: Some(LoggingLayer {
				level: Some("DEBUG".into()),
				format: Some("compact".into()),
			}),
			..Default::default()
		};
		let (config, unresolved) = TaskdeckConfig::resolve(layer, None);

		assert_eq!(config.retry.base_delay, Duration::from_millis(50));
		assert_eq!(config.logging.level, LogLevel::Debug);
		assert_eq!(config.logging.format, LogFormat::Compact);
		assert!(unresolved.log_level.is_none());
	}

	#[test]
	fn test_unknown_log_level_is_recorded() {
		let layer = ConfigLayer {
			logging: Some(LoggingLayer {
				level: Some("loud".into()),
				format: None,
			}),
			..Default::default()
		};
		let (config, unresolved) = TaskdeckConfig::resolve(layer, None);
		assert_eq!(config.logging.level, LogLevel::Info);
		assert_eq!(unresolved.log_level.as_deref(), Some("loud"));
	}

	#[test]
	fn test_serializes_durations_as_numbers() {
		let json = serde_json::to_value(TaskdeckConfig::default()).unwrap();
		assert_eq!(json["api"]["read_timeout"], 10);
		assert_eq!(json["retry"]["base_delay"], 1000);
		assert!(json.get("paths").is_none());
	}
}
