// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared reqwest client construction with a consistent User-Agent header.

use reqwest::ClientBuilder;

/// Creates a reqwest client builder with the standard Taskdeck User-Agent.
///
/// No client-level timeout is set; per-request deadlines are enforced by
/// [`crate::ResilientHttpClient`].
pub fn builder() -> ClientBuilder {
	reqwest::Client::builder().user_agent(user_agent())
}

/// Returns the standard Taskdeck User-Agent string.
///
/// Format: `taskdeck/{version} ({os}-{arch})`
pub fn user_agent() -> String {
	format!(
		"taskdeck/{} ({}-{})",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}
