// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wiring of store, HTTP client and services from configuration.

use std::sync::Arc;

use chrono::TimeDelta;
use taskdeck_common_http::{BuildError, RequestProfile, ResilientHttpClient, RetryPolicy};
use taskdeck_config::TaskdeckConfig;
use taskdeck_session_store::{AuthContextProvider, SessionStore, SESSION_LIFETIME};
use tracing::{debug, warn};

use crate::session::SessionService;
use crate::tasks::TaskService;

/// Keychain service name used when the keyring backend is enabled.
pub const KEYRING_SERVICE: &str = "taskdeck";

/// Everything a front end needs, sharing one store and one HTTP client.
#[derive(Debug, Clone)]
pub struct ClientContext {
	pub store: Arc<SessionStore>,
	pub http: Arc<ResilientHttpClient>,
	pub session: Arc<SessionService>,
	pub tasks: TaskService,
}

impl ClientContext {
	pub fn from_config(config: &TaskdeckConfig) -> Result<Self, BuildError> {
		Self::with_store(config, store_for(config))
	}

	/// Builds the context around an existing store.
	pub fn with_store(config: &TaskdeckConfig, store: SessionStore) -> Result<Self, BuildError> {
		let store = Arc::new(store);
		let http = Arc::new(
			ResilientHttpClient::builder()
				.base_url(&config.api.base_url)
				.auth(Arc::new(AuthContextProvider::new(store.clone())))
				.read_profile(RequestProfile {
					timeout: config.api.read_timeout,
					retry: RetryPolicy::new(config.retry.max_attempts, config.retry.base_delay),
				})
				.mutation_profile(RequestProfile {
					timeout: config.api.write_timeout,
					retry: RetryPolicy::new(
						config.retry.mutation_max_attempts,
						config.retry.base_delay,
					),
				})
				.build()?,
		);
		debug!(base_url = %http.base_url(), "client context ready");

		Ok(Self {
			session: Arc::new(SessionService::new(http.clone(), store.clone())),
			tasks: TaskService::new(http.clone()),
			store,
			http,
		})
	}
}

fn store_for(config: &TaskdeckConfig) -> SessionStore {
	let lifetime = TimeDelta::from_std(config.session.lifetime).unwrap_or_else(|_| {
		warn!("session lifetime out of range, using the default");
		SESSION_LIFETIME
	});

	#[cfg(feature = "keyring")]
	if config.session.keyring {
		return SessionStore::with_keyring(KEYRING_SERVICE, &config.session.file)
			.with_lifetime(lifetime);
	}
	#[cfg(not(feature = "keyring"))]
	if config.session.keyring {
		warn!("keyring support not compiled in, storing the session in a file");
	}

	SessionStore::with_file(&config.session.file).with_lifetime(lifetime)
}
