// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Key/value backends that hold the serialized session.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::StoreError;

/// On-disk document format of [`FileBackend`].
pub type PersistedEntries = HashMap<String, String>;

/// A raw string store addressed by key.
///
/// Backends know nothing about sessions; [`crate::SessionStore`] owns
/// serialization, ordering and fallback.
#[async_trait]
pub trait SessionBackend: Send + Sync + std::fmt::Debug {
	/// Short name used in logs.
	fn name(&self) -> &str;

	async fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

	async fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;

	/// Removes the key. Removing a missing key succeeds.
	async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// JSON file backend with atomic replace and restricted permissions
/// (0600 on Unix).
#[derive(Debug, Clone)]
pub struct FileBackend {
	path: PathBuf,
}

impl FileBackend {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	async fn read_entries(&self) -> Result<PersistedEntries, StoreError> {
		if !fs::try_exists(&self.path).await? {
			return Ok(HashMap::new());
		}

		let contents = fs::read_to_string(&self.path).await?;
		if contents.trim().is_empty() {
			return Ok(HashMap::new());
		}
		Ok(serde_json::from_str(&contents)?)
	}

	async fn write_entries(&self, entries: &PersistedEntries) -> Result<(), StoreError> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent).await?;
		}

		let contents = serde_json::to_string_pretty(entries)?;

		let temp_path = self.path.with_extension("tmp");
		let mut file = fs::File::create(&temp_path).await?;
		file.write_all(contents.as_bytes()).await?;
		file.sync_all().await?;
		drop(file);

		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			let perms = std::fs::Permissions::from_mode(0o600);
			if let Err(e) = fs::set_permissions(&temp_path, perms).await {
				warn!(path = ?temp_path, error = %e, "failed to set session file permissions to 0600");
			}
		}

		fs::rename(&temp_path, &self.path).await?;

		debug!(path = ?self.path, "session file written");
		Ok(())
	}
}

#[async_trait]
impl SessionBackend for FileBackend {
	fn name(&self) -> &str {
		"file"
	}

	async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
		let entries = self.read_entries().await?;
		Ok(entries.get(key).cloned())
	}

	async fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
		// A corrupt document is replaced rather than blocking every write.
		let mut entries = match self.read_entries().await {
			Ok(entries) => entries,
			Err(StoreError::Serde(e)) => {
				warn!(path = ?self.path, error = %e, "discarding unreadable session file");
				HashMap::new()
			}
			Err(e) => return Err(e),
		};
		entries.insert(key.to_string(), value.to_string());
		self.write_entries(&entries).await
	}

	async fn remove(&self, key: &str) -> Result<(), StoreError> {
		let mut entries = self.read_entries().await?;
		if entries.remove(key).is_none() {
			return Ok(());
		}
		self.write_entries(&entries).await
	}
}

/// Process-lifetime backend; the fallback of last resort and the test double.
#[derive(Debug, Default)]
pub struct MemoryBackend {
	entries: tokio::sync::RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl SessionBackend for MemoryBackend {
	fn name(&self) -> &str {
		"memory"
	}

	async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
		Ok(self.entries.read().await.get(key).cloned())
	}

	async fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
		self
			.entries
			.write()
			.await
			.insert(key.to_string(), value.to_string());
		Ok(())
	}

	async fn remove(&self, key: &str) -> Result<(), StoreError> {
		self.entries.write().await.remove(key);
		Ok(())
	}
}
