// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Expiry-aware persistence of the single active session.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, error, info, warn};

use crate::backend::{FileBackend, MemoryBackend, SessionBackend};
use crate::record::{PersistedSession, SessionRecord, UserProfile};
use crate::token::SessionToken;

/// Fixed storage key of the session record.
pub const SESSION_STORAGE_KEY: &str = "auth";

/// How long a session stays valid after it was issued.
pub const SESSION_LIFETIME: TimeDelta = TimeDelta::days(7);

/// Session-derived identity as seen by the rest of the application.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
	pub user: Option<UserProfile>,
	pub token: Option<SessionToken>,
	pub is_authenticated: bool,
}

impl SessionState {
	pub fn unauthenticated() -> Self {
		Self::default()
	}

	fn authenticated(record: SessionRecord) -> Self {
		Self {
			user: Some(record.user().clone()),
			token: Some(record.token().clone()),
			is_authenticated: true,
		}
	}
}

/// `true` iff `now - issued_at < lifetime`. Unparseable timestamps are
/// never valid.
pub fn is_session_valid(record: &SessionRecord, now: DateTime<Utc>, lifetime: TimeDelta) -> bool {
	match record.issued_at() {
		Some(issued_at) => now.signed_duration_since(issued_at) < lifetime,
		None => false,
	}
}

/// Holds at most one [`SessionRecord`] across an ordered list of backends.
///
/// Writes go to the first backend that accepts them; reads are answered by
/// the first backend that holds a value. Storage failures are logged and
/// never returned to callers. There is no locking across operations: the
/// last `save` or `clear` to complete wins.
#[derive(Debug)]
pub struct SessionStore {
	backends: Vec<Arc<dyn SessionBackend>>,
	key: String,
	lifetime: TimeDelta,
}

impl SessionStore {
	/// Creates a store over `backends`, primary first.
	pub fn new(backends: Vec<Arc<dyn SessionBackend>>) -> Self {
		if backends.is_empty() {
			warn!("session store created without backends; sessions will not persist");
		}
		Self {
			backends,
			key: SESSION_STORAGE_KEY.to_string(),
			lifetime: SESSION_LIFETIME,
		}
	}

	/// File primary with an in-memory fallback.
	pub fn with_file(path: impl Into<PathBuf>) -> Self {
		Self::new(vec![
			Arc::new(FileBackend::new(path)),
			Arc::new(MemoryBackend::new()),
		])
	}

	/// OS keychain primary, file secondary, memory last.
	#[cfg(feature = "keyring")]
	pub fn with_keyring(service: impl Into<String>, path: impl Into<PathBuf>) -> Self {
		Self::new(vec![
			Arc::new(crate::backend_keyring::KeyringBackend::new(service)),
			Arc::new(FileBackend::new(path)),
			Arc::new(MemoryBackend::new()),
		])
	}

	/// Two independent in-memory backends.
	pub fn in_memory() -> Self {
		Self::new(vec![
			Arc::new(MemoryBackend::new()),
			Arc::new(MemoryBackend::new()),
		])
	}

	/// Overrides the storage key.
	pub fn with_key(mut self, key: impl Into<String>) -> Self {
		self.key = key.into();
		self
	}

	/// Overrides the session lifetime.
	pub fn with_lifetime(mut self, lifetime: TimeDelta) -> Self {
		self.lifetime = lifetime;
		self
	}

	pub fn backends(&self) -> &[Arc<dyn SessionBackend>] {
		&self.backends
	}

	pub fn key(&self) -> &str {
		&self.key
	}

	pub fn lifetime(&self) -> TimeDelta {
		self.lifetime
	}

	/// Persists `record` to the first backend that accepts the write.
	///
	/// Backends after the accepting one are left untouched.
	pub async fn save(&self, record: &SessionRecord) {
		let serialized = match serde_json::to_string(&PersistedSession::from(record)) {
			Ok(serialized) => serialized,
			Err(e) => {
				error!(error = %e, "failed to serialize session record");
				return;
			}
		};

		for backend in &self.backends {
			match backend.write(&self.key, &serialized).await {
				Ok(()) => {
					debug!(backend = backend.name(), "session saved");
					return;
				}
				Err(e) => {
					warn!(backend = backend.name(), error = %e, "session write failed, trying next backend");
				}
			}
		}

		error!(
			backends = self.backends.len(),
			"session could not be saved to any backend"
		);
	}

	/// Loads the stored record without checking validity.
	///
	/// The first backend holding a value decides; a malformed value is
	/// reported as absent.
	pub async fn load(&self) -> Option<SessionRecord> {
		for backend in &self.backends {
			let raw = match backend.read(&self.key).await {
				Ok(Some(raw)) => raw,
				Ok(None) => continue,
				Err(e) => {
					warn!(backend = backend.name(), error = %e, "session read failed, trying next backend");
					continue;
				}
			};

			return match serde_json::from_str::<PersistedSession>(&raw) {
				Ok(persisted) => Some(SessionRecord::from(persisted)),
				Err(e) => {
					warn!(backend = backend.name(), error = %e, "stored session is malformed, treating as absent");
					None
				}
			};
		}
		None
	}

	/// Removes the record from every backend.
	pub async fn clear(&self) {
		for backend in &self.backends {
			if let Err(e) = backend.remove(&self.key).await {
				warn!(backend = backend.name(), error = %e, "failed to remove session from backend");
			}
		}
		debug!("session cleared");
	}

	pub fn is_valid(&self, record: &SessionRecord, now: DateTime<Utc>) -> bool {
		is_session_valid(record, now, self.lifetime)
	}

	/// Current authentication state. An expired or corrupt record is cleared
	/// from every backend before this returns.
	pub async fn state(&self) -> SessionState {
		match self.load().await {
			Some(record) if self.is_valid(&record, Utc::now()) => SessionState::authenticated(record),
			Some(_) => {
				info!("stored session expired, clearing");
				self.clear().await;
				SessionState::unauthenticated()
			}
			None => SessionState::unauthenticated(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::StoreError;
	use async_trait::async_trait;
	use proptest::prelude::*;
	use serde_json::json;

	#[derive(Debug)]
	struct BrokenBackend;

	#[async_trait]
	impl SessionBackend for BrokenBackend {
		fn name(&self) -> &str {
			"broken"
		}

		async fn read(&self, _key: &str) -> Result<Option<String>, StoreError> {
			Err(StoreError::Unavailable("quota exceeded".into()))
		}

		async fn write(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
			Err(StoreError::Unavailable("quota exceeded".into()))
		}

		async fn remove(&self, _key: &str) -> Result<(), StoreError> {
			Err(StoreError::Unavailable("quota exceeded".into()))
		}
	}

	fn user(id: &str) -> UserProfile {
		UserProfile::from_value(json!({ "id": id, "username": "a" })).unwrap()
	}

	fn record_issued(at: DateTime<Utc>) -> SessionRecord {
		SessionRecord::new(user("u1"), SessionToken::new("tok"), at)
	}

	fn pair() -> (Arc<MemoryBackend>, Arc<MemoryBackend>, SessionStore) {
		let primary = Arc::new(MemoryBackend::new());
		let secondary = Arc::new(MemoryBackend::new());
		let store = SessionStore::new(vec![primary.clone(), secondary.clone()]);
		(primary, secondary, store)
	}

	#[test]
	fn expiry_boundary() {
		let now = Utc::now();
		let just_inside = record_issued(now - SESSION_LIFETIME + TimeDelta::milliseconds(1));
		let just_outside = record_issued(now - SESSION_LIFETIME - TimeDelta::milliseconds(1));
		let exactly = record_issued(now - SESSION_LIFETIME);

		assert!(is_session_valid(&just_inside, now, SESSION_LIFETIME));
		assert!(!is_session_valid(&just_outside, now, SESSION_LIFETIME));
		assert!(!is_session_valid(&exactly, now, SESSION_LIFETIME));
	}

	#[tokio::test]
	async fn expired_record_is_cleared_on_read() {
		let (primary, secondary, store) = pair();
		let stale = record_issued(Utc::now() - SESSION_LIFETIME - TimeDelta::milliseconds(1));
		store.save(&stale).await;
		secondary
			.write(SESSION_STORAGE_KEY, &serde_json::to_string(&PersistedSession::from(&stale)).unwrap())
			.await
			.unwrap();

		let state = store.state().await;
		assert!(!state.is_authenticated);
		assert!(state.user.is_none() && state.token.is_none());
		assert!(primary.read(SESSION_STORAGE_KEY).await.unwrap().is_none());
		assert!(secondary.read(SESSION_STORAGE_KEY).await.unwrap().is_none());
		assert!(store.load().await.is_none());
	}

	#[tokio::test]
	async fn eight_day_old_session_is_unauthenticated() {
		let (primary, _, store) = pair();
		let seeded = json!({
			"user": { "id": "u1", "username": "a" },
			"token": "tok",
			"timestamp": (Utc::now() - TimeDelta::days(8)).timestamp_millis()
		});
		primary
			.write(SESSION_STORAGE_KEY, &seeded.to_string())
			.await
			.unwrap();

		assert!(!store.state().await.is_authenticated);
		assert!(store.load().await.is_none());
	}

	#[tokio::test]
	async fn corrupt_timestamp_is_invalid_and_cleared() {
		let (primary, _, store) = pair();
		primary
			.write(
				SESSION_STORAGE_KEY,
				r#"{"user":{"id":"u1"},"token":"tok","timestamp":"not-a-date"}"#,
			)
			.await
			.unwrap();

		assert!(store.load().await.is_some());
		assert!(!store.state().await.is_authenticated);
		assert!(store.load().await.is_none());
	}

	#[tokio::test]
	async fn falls_back_when_primary_write_fails() {
		let secondary = Arc::new(MemoryBackend::new());
		let store = SessionStore::new(vec![Arc::new(BrokenBackend), secondary.clone()]);
		let record = record_issued(Utc::now());

		store.save(&record).await;

		assert!(secondary.read(SESSION_STORAGE_KEY).await.unwrap().is_some());
		assert_eq!(store.load().await, Some(record));
		assert!(store.state().await.is_authenticated);
	}

	#[tokio::test]
	async fn save_never_fails_even_without_a_working_backend() {
		let store = SessionStore::new(vec![Arc::new(BrokenBackend), Arc::new(BrokenBackend)]);
		store.save(&record_issued(Utc::now())).await;
		store.clear().await;
		assert!(store.load().await.is_none());
		assert!(!store.state().await.is_authenticated);
	}

	#[tokio::test]
	async fn save_replaces_previous_record() {
		let (_, _, store) = pair();
		store.save(&record_issued(Utc::now())).await;
		let newer = SessionRecord::new(user("u2"), SessionToken::new("tok2"), Utc::now());
		store.save(&newer).await;

		let loaded = store.load().await.unwrap();
		assert_eq!(loaded.user().id(), Some("u2"));
		assert_eq!(loaded.token().expose(), "tok2");
	}

	#[tokio::test]
	async fn primary_wins_over_stale_secondary_copy() {
		let (primary, secondary, store) = pair();
		let old = SessionRecord::new(user("old"), SessionToken::new("t-old"), Utc::now());
		secondary
			.write(SESSION_STORAGE_KEY, &serde_json::to_string(&PersistedSession::from(&old)).unwrap())
			.await
			.unwrap();

		store.save(&record_issued(Utc::now())).await;

		assert_eq!(store.load().await.unwrap().user().id(), Some("u1"));
		// The secondary copy is left in place after a primary write.
		assert!(secondary.read(SESSION_STORAGE_KEY).await.unwrap().is_some());
		assert!(primary.read(SESSION_STORAGE_KEY).await.unwrap().is_some());
	}

	#[tokio::test]
	async fn malformed_primary_value_reads_as_absent() {
		let (primary, secondary, store) = pair();
		primary.write(SESSION_STORAGE_KEY, "{oops").await.unwrap();
		secondary
			.write(
				SESSION_STORAGE_KEY,
				&serde_json::to_string(&PersistedSession::from(&record_issued(Utc::now()))).unwrap(),
			)
			.await
			.unwrap();

		assert!(store.load().await.is_none());
	}

	#[tokio::test]
	async fn unreadable_primary_falls_through_to_secondary() {
		let secondary = Arc::new(MemoryBackend::new());
		secondary
			.write(
				SESSION_STORAGE_KEY,
				&serde_json::to_string(&PersistedSession::from(&record_issued(Utc::now()))).unwrap(),
			)
			.await
			.unwrap();
		let store = SessionStore::new(vec![Arc::new(BrokenBackend), secondary]);

		assert_eq!(store.load().await.unwrap().user().id(), Some("u1"));
	}

	#[tokio::test]
	async fn state_is_idempotent() {
		let (_, _, store) = pair();
		store.save(&record_issued(Utc::now())).await;

		let first = store.state().await;
		let second = store.state().await;
		assert!(first.is_authenticated);
		assert_eq!(first, second);
	}

	#[tokio::test]
	async fn clear_removes_from_every_backend() {
		let (primary, secondary, store) = pair();
		let raw = serde_json::to_string(&PersistedSession::from(&record_issued(Utc::now()))).unwrap();
		primary.write(SESSION_STORAGE_KEY, &raw).await.unwrap();
		secondary.write(SESSION_STORAGE_KEY, &raw).await.unwrap();

		store.clear().await;

		assert!(primary.read(SESSION_STORAGE_KEY).await.unwrap().is_none());
		assert!(secondary.read(SESSION_STORAGE_KEY).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn file_store_survives_reopen() {
		let temp_dir = tempfile::tempdir().unwrap();
		let path = temp_dir.path().join("session.json");

		SessionStore::with_file(&path)
			.save(&record_issued(Utc::now()))
			.await;

		let reopened = SessionStore::with_file(&path);
		let state = reopened.state().await;
		assert!(state.is_authenticated);
		assert_eq!(state.user.unwrap().id(), Some("u1"));
	}

	#[tokio::test]
	async fn custom_key_and_lifetime() {
		let (primary, _, store) = pair();
		let store = store.with_key("session").with_lifetime(TimeDelta::minutes(5));
		store
			.save(&record_issued(Utc::now() - TimeDelta::minutes(6)))
			.await;

		assert!(primary.read("session").await.unwrap().is_some());
		assert!(primary.read(SESSION_STORAGE_KEY).await.unwrap().is_none());
		assert!(!store.state().await.is_authenticated);
	}

	proptest! {
		#[test]
		fn validity_flips_exactly_at_the_lifetime(age_ms in 0i64..1_209_600_000) {
			let now = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
			let record = record_issued(now - TimeDelta::milliseconds(age_ms));
			prop_assert_eq!(
				is_session_valid(&record, now, SESSION_LIFETIME),
				age_ms < SESSION_LIFETIME.num_milliseconds()
			);
		}
	}
}
