// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session persistence and credential attachment for Taskdeck.
//!
//! # Features
//!
//! - **SessionStore**: at most one session record, persisted to the first
//!   working backend of an ordered list and expired after seven days
//! - **SessionBackend**: raw key/value backends (file, memory, and the OS
//!   keychain behind the `keyring` feature)
//! - **AuthContextProvider**: bearer headers for the resilient HTTP client
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use taskdeck_session_store::{SessionRecord, SessionStore, SessionToken, UserProfile};
//!
//! # tokio_test::block_on(async {
//! let store = SessionStore::in_memory();
//! let user = UserProfile::from_value(serde_json::json!({ "id": "u1" })).unwrap();
//! store.save(&SessionRecord::new(user, SessionToken::new("tok"), Utc::now())).await;
//!
//! assert!(store.state().await.is_authenticated);
//! # });
//! ```

mod auth;
mod backend;
#[cfg(feature = "keyring")]
mod backend_keyring;
mod error;
mod record;
mod store;
mod token;

pub use auth::AuthContextProvider;
pub use backend::{FileBackend, MemoryBackend, PersistedEntries, SessionBackend};
#[cfg(feature = "keyring")]
pub use backend_keyring::KeyringBackend;
pub use error::StoreError;
pub use record::{PersistedSession, SessionRecord, UserProfile};
pub use store::{
	is_session_valid, SessionState, SessionStore, SESSION_LIFETIME, SESSION_STORAGE_KEY,
};
pub use token::SessionToken;
