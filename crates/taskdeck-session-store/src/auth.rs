// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bearer credentials derived from the stored session.

use std::sync::Arc;

use async_trait::async_trait;
use taskdeck_common_http::{AuthHeaderSource, HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::warn;

use crate::store::SessionStore;
use crate::token::SessionToken;

/// Produces `Authorization` headers from the current [`SessionStore`] state.
///
/// Nothing is cached: every call re-reads the store, so an expired session
/// is cleared and stops being sent on the very next request.
#[derive(Debug, Clone)]
pub struct AuthContextProvider {
	store: Arc<SessionStore>,
}

impl AuthContextProvider {
	pub fn new(store: Arc<SessionStore>) -> Self {
		Self { store }
	}

	pub fn store(&self) -> &Arc<SessionStore> {
		&self.store
	}

	/// The token of a valid session, if any.
	pub async fn token(&self) -> Option<SessionToken> {
		let state = self.store.state().await;
		if state.is_authenticated {
			state.token
		} else {
			None
		}
	}

	pub async fn auth_headers(&self) -> HeaderMap {
		let mut headers = HeaderMap::new();
		let Some(token) = self.token().await else {
			return headers;
		};

		match HeaderValue::from_str(&format!("Bearer {}", token.expose())) {
			Ok(mut value) => {
				value.set_sensitive(true);
				headers.insert(AUTHORIZATION, value);
			}
			Err(_) => {
				warn!("stored session token is not a valid header value, sending request without credentials");
			}
		}
		headers
	}
}

#[async_trait]
impl AuthHeaderSource for AuthContextProvider {
	async fn headers(&self) -> HeaderMap {
		self.auth_headers().await
	}
}
