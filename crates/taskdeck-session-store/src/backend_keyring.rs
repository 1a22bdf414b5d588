// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::backend::SessionBackend;
use crate::error::StoreError;

/// OS keychain backend. Each storage key becomes a keyring entry under
/// `service`.
#[derive(Debug, Clone)]
pub struct KeyringBackend {
	service: String,
}

impl KeyringBackend {
	pub fn new(service: impl Into<String>) -> Self {
		Self {
			service: service.into(),
		}
	}
}

fn entry(service: &str, key: &str) -> Result<keyring::Entry, StoreError> {
	keyring::Entry::new(service, key).map_err(|e| StoreError::Backend(e.to_string()))
}

#[async_trait]
impl SessionBackend for KeyringBackend {
	fn name(&self) -> &str {
		"keyring"
	}

	async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
		let service = self.service.clone();
		let key = key.to_string();

		tokio::task::spawn_blocking(move || match entry(&service, &key)?.get_password() {
			Ok(data) => Ok(Some(data)),
			Err(keyring::Error::NoEntry) => Ok(None),
			Err(e) => Err(StoreError::Backend(e.to_string())),
		})
		.await
		.map_err(|e| StoreError::Backend(e.to_string()))?
	}

	async fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
		let service = self.service.clone();
		let key = key.to_string();
		let value = value.to_string();

		tokio::task::spawn_blocking(move || {
			entry(&service, &key)?
				.set_password(&value)
				.map_err(|e| StoreError::Backend(e.to_string()))?;

			// Read back through a fresh entry: mock keyrings only keep the
			// value on the instance that wrote it.
			match entry(&service, &key)?.get_password() {
				Ok(stored) if stored == value => Ok(()),
				Ok(_) => Err(StoreError::Unavailable(
					"keyring verification failed: stored data mismatch".to_string(),
				)),
				Err(keyring::Error::NoEntry) => Err(StoreError::Unavailable(
					"keyring verification failed: value not persisted".to_string(),
				)),
				Err(e) => Err(StoreError::Backend(format!("keyring verification failed: {e}"))),
			}
		})
		.await
		.map_err(|e| StoreError::Backend(e.to_string()))?
	}

	async fn remove(&self, key: &str) -> Result<(), StoreError> {
		let service = self.service.clone();
		let key = key.to_string();

		tokio::task::spawn_blocking(move || match entry(&service, &key)?.delete_credential() {
			Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
			Err(e) => Err(StoreError::Backend(e.to_string())),
		})
		.await
		.map_err(|e| StoreError::Backend(e.to_string()))?
	}
}
