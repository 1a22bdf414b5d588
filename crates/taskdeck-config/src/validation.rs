// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration validation rules.

use std::time::Duration;

use tracing::warn;

use crate::runtime::{TaskdeckConfig, Unresolved};
use crate::ConfigError;

/// Validate the configuration.
///
/// Returns Ok(()) if valid, or ConfigError::InvalidValue naming the field.
pub fn validate_config(config: &TaskdeckConfig) -> Result<(), ConfigError> {
	validate_api(config)?;
	validate_retry(config)?;
	validate_session(config)?;
	Ok(())
}

pub(crate) fn validate_resolved(
	config: &TaskdeckConfig,
	unresolved: &Unresolved,
) -> Result<(), ConfigError> {
	if let Some(level) = &unresolved.log_level {
		return Err(ConfigError::invalid_value(
			"logging.level",
			format!("unknown level '{level}' (expected error, warn, info, debug or trace)"),
		));
	}
	if let Some(format) = &unresolved.log_format {
		return Err(ConfigError::invalid_value(
			"logging.format",
			format!("unknown format '{format}' (expected pretty, compact or json)"),
		));
	}
	validate_config(config)
}

fn validate_api(config: &TaskdeckConfig) -> Result<(), ConfigError> {
	let base_url = config.api.base_url.trim();
	if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
		return Err(ConfigError::invalid_value(
			"api.base_url",
			format!("'{base_url}' must start with http:// or https://"),
		));
	}
	if base_url.starts_with("http://") && !is_local(base_url) {
		warn!(base_url = %base_url, "API base URL is not using TLS");
	}

	non_zero("api.read_timeout_secs", config.api.read_timeout)?;
	non_zero("api.write_timeout_secs", config.api.write_timeout)?;
	Ok(())
}

fn validate_retry(config: &TaskdeckConfig) -> Result<(), ConfigError> {
	if config.retry.max_attempts == 0 {
		return Err(ConfigError::invalid_value(
			"retry.max_attempts",
			"must be at least 1",
		));
	}
	if config.retry.mutation_max_attempts == 0 {
		return Err(ConfigError::invalid_value(
			"retry.mutation_max_attempts",
			"must be at least 1",
		));
	}
	if config.retry.max_attempts > 10 || config.retry.mutation_max_attempts > 10 {
		warn!(
			max_attempts = config.retry.max_attempts,
			mutation_max_attempts = config.retry.mutation_max_attempts,
			"retry attempts are unusually high"
		);
	}
	Ok(())
}

fn validate_session(config: &TaskdeckConfig) -> Result<(), ConfigError> {
	non_zero("session.lifetime_secs", config.session.lifetime)?;
	if config.session.file.as_os_str().is_empty() {
		return Err(ConfigError::invalid_value("session.file", "cannot be empty"));
	}
	Ok(())
}

fn non_zero(field: &str, value: Duration) -> Result<(), ConfigError> {
	if value.is_zero() {
		return Err(ConfigError::invalid_value(field, "must be greater than 0"));
	}
	Ok(())
}

fn is_local(url: &str) -> bool {
	let rest = url.trim_start_matches("http://");
	rest.starts_with("localhost") || rest.starts_with("127.0.0.1") || rest.starts_with("[::1]")
}
