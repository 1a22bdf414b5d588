// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! XDG Base Directory compliant path resolution.

use std::path::{Path, PathBuf};

use crate::ConfigError;

const APP_DIR: &str = "taskdeck";

/// Resolved XDG paths for Taskdeck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsConfig {
	/// User config file: ~/.config/taskdeck/config.toml
	pub user_config_file: PathBuf,
	/// System config file: /etc/taskdeck/config.toml
	pub system_config_file: PathBuf,
	/// Data directory: ~/.local/share/taskdeck/
	pub data_dir: PathBuf,
}

impl PathsConfig {
	/// Paths rooted under explicit config and data homes.
	pub fn under(config_home: &Path, data_home: &Path) -> Self {
		Self {
			user_config_file: config_home.join(APP_DIR).join("config.toml"),
			system_config_file: PathBuf::from("/etc/taskdeck/config.toml"),
			data_dir: data_home.join(APP_DIR),
		}
	}

	/// Default location of the persisted session.
	pub fn session_file(&self) -> PathBuf {
		self.data_dir.join("session.json")
	}
}

/// Resolve XDG paths according to the Base Directory Specification.
///
/// Uses `XDG_CONFIG_HOME` and `XDG_DATA_HOME` if set, otherwise
/// `~/.config` and `~/.local/share`.
pub fn resolve_xdg_paths() -> Result<PathsConfig, ConfigError> {
	let home = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;

	let config_home = std::env::var_os("XDG_CONFIG_HOME")
		.map(PathBuf::from)
		.unwrap_or_else(|| home.join(".config"));

	let data_home = std::env::var_os("XDG_DATA_HOME")
		.map(PathBuf::from)
		.unwrap_or_else(|| home.join(".local/share"));

	tracing::debug!(
		config_home = %config_home.display(),
		data_home = %data_home.display(),
		"resolved XDG paths"
	);

	Ok(PathsConfig::under(&config_home, &data_home))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_paths_under_explicit_homes() {
		let paths = PathsConfig::under(Path::new("/cfg"), Path::new("/data"));
		assert_eq!(
			paths.user_config_file,
			PathBuf::from("/cfg/taskdeck/config.toml")
		);
		assert_eq!(paths.session_file(), PathBuf::from("/data/taskdeck/session.json"));
		assert_eq!(
			paths.system_config_file,
			PathBuf::from("/etc/taskdeck/config.toml")
		);
	}

	#[test]
	fn test_resolve_xdg_paths_succeeds() {
		let paths = resolve_xdg_paths().unwrap();
		assert!(paths.user_config_file.to_string_lossy().contains("taskdeck"));
		assert!(paths.data_dir.to_string_lossy().ends_with("taskdeck"));
	}
}
