// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Storage error types.

/// Errors raised by individual session backends.
///
/// [`crate::SessionStore`] recovers from all of these locally; they are only
/// visible to code that talks to a backend directly.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("IO error: {0}")]
	Io(String),

	#[error("Serialization error: {0}")]
	Serde(String),

	#[error("Backend error: {0}")]
	Backend(String),

	#[error("Backend unavailable: {0}")]
	Unavailable(String),
}

impl From<std::io::Error> for StoreError {
	fn from(err: std::io::Error) -> Self {
		StoreError::Io(err.to_string())
	}
}

impl From<serde_json::Error> for StoreError {
	fn from(err: serde_json::Error) -> Self {
		StoreError::Serde(err.to_string())
	}
}
