// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration registry - manages sources and merges layers.

use tracing::{debug, info};

use crate::layer::ConfigLayer;
use crate::paths::PathsConfig;
use crate::runtime::TaskdeckConfig;
use crate::sources::ConfigSource;
use crate::validation::validate_resolved;
use crate::ConfigError;

/// Registry that manages configuration sources and merges them.
pub struct ConfigRegistry {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl ConfigRegistry {
	/// Create a new empty registry.
	pub fn new() -> Self {
		Self {
			sources: Vec::new(),
		}
	}

	/// Register a configuration source.
	pub fn register(&mut self, source: Box<dyn ConfigSource>) {
		debug!(source = source.name(), precedence = ?source.precedence(), "registering config source");
		self.sources.push(source);
	}

	/// Load configuration from all sources, merge, and validate.
	///
	/// Sources are merged lowest precedence first. A file that exists but
	/// does not parse is an error; a missing file is not.
	pub fn load(&self, paths: PathsConfig) -> Result<TaskdeckConfig, ConfigError> {
		let mut sorted_sources: Vec<_> = self.sources.iter().collect();
		sorted_sources.sort_by_key(|s| s.precedence());

		info!(
			source_count = sorted_sources.len(),
			"loading configuration from sources"
		);

		let mut merged = ConfigLayer::default();
		for source in &sorted_sources {
			let layer = source.load()?;
			debug!(source = source.name(), "merging config layer");
			merged.merge(layer);
		}

		let (config, unresolved) = TaskdeckConfig::resolve(merged, Some(paths));
		validate_resolved(&config, &unresolved)?;

		info!(
			base_url = %config.api.base_url,
			log_level = ?config.logging.level,
			"configuration loaded successfully"
		);

		Ok(config)
	}

	/// Get the number of registered sources.
	pub fn source_count(&self) -> usize {
		self.sources.len()
	}
}

impl Default for ConfigRegistry {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::layer::{ApiLayer, RetryLayer};
	use crate::sources::{DefaultsSource, EnvSource, FileSource, Precedence};
	use std::path::Path;

	fn test_paths() -> PathsConfig {
		PathsConfig::under(Path::new("/tmp/test/config"), Path::new("/tmp/test/data"))
	}

	struct FixedSource {
		precedence: Precedence,
		layer: ConfigLayer,
	}

	impl ConfigSource for FixedSource {
		fn name(&self) -> &'static str {
			"fixed"
		}
		fn precedence(&self) -> Precedence {
			self.precedence
		}
		fn load(&self) -> Result<ConfigLayer, ConfigError> {
			Ok(self.layer.clone())
		}
	}

	fn base_url_layer(url: &str) -> ConfigLayer {
		ConfigLayer {
			api: Some(ApiLayer {
				base_url: Some(url.to_string()),
				..Default::default()
			}),
			..Default::default()
		}
	}

	#[test]
	fn test_registry_loads_with_defaults() {
		let mut registry = ConfigRegistry::new();
		registry.register(Box::new(DefaultsSource));
		assert_eq!(registry.source_count(), 1);

		let config = registry.load(test_paths()).unwrap();
		assert_eq!(config.api.base_url, "http://localhost:5001/api");
	}

	/// Registration order does not matter; precedence does.
	#[test]
	fn test_precedence_merge_order() {
		let mut registry = ConfigRegistry::new();
		registry.register(Box::new(FixedSource {
			precedence: Precedence::Cli,
			layer: base_url_layer("http://cli/api"),
		}));
		registry.register(Box::new(FixedSource {
			precedence: Precedence::UserFile,
			layer: ConfigLayer {
				retry: Some(RetryLayer {
					max_attempts: Some(4),
					..Default::default()
				}),
				..base_url_layer("http://file/api")
			},
		}));

		let config = registry.load(test_paths()).unwrap();
		assert_eq!(config.api.base_url, "http://cli/api");
		assert_eq!(config.retry.max_attempts, 4);
	}

	#[test]
	fn test_file_then_env_layering() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.toml");
		std::fs::write(
			&path,
			"[api]\nbase_url = \"http://file/api\"\n[retry]\nbase_delay_ms = 10\n",
		)
		.unwrap();

		let mut registry = ConfigRegistry::new();
		registry.register(Box::new(DefaultsSource));
		registry.register(Box::new(FileSource::custom(path, Precedence::UserFile, "test")));
		registry.register(Box::new(EnvSource::from_vars([(
			"TASKDECK_API_BASE_URL",
			"https://env/api",
		)])));

		let config = registry.load(test_paths()).unwrap();
		assert_eq!(config.api.base_url, "https://env/api");
		assert_eq!(config.retry.base_delay.as_millis(), 10);
	}

	#[test]
	fn test_invalid_result_is_rejected() {
		let mut registry = ConfigRegistry::new();
		registry.register(Box::new(FixedSource {
			precedence: Precedence::Environment,
			layer: base_url_layer("ftp://nope"),
		}));
		assert!(matches!(
			registry.load(test_paths()),
			Err(ConfigError::InvalidValue { .. })
		));
	}
}
