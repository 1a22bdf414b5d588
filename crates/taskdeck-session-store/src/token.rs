// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bearer token wrapper that keeps the value out of logs.

use std::fmt;

use zeroize::Zeroize;

/// Placeholder printed instead of the token.
pub const REDACTED: &str = "[REDACTED]";

/// An opaque bearer token issued by the remote service.
///
/// Debug and Display are redacted, the memory is zeroized on drop, and the
/// raw value is only reachable through [`SessionToken::expose`].
#[derive(Clone, Zeroize, PartialEq, Eq)]
#[zeroize(drop)]
pub struct SessionToken(String);

impl SessionToken {
	pub fn new(token: impl Into<String>) -> Self {
		Self(token.into())
	}

	pub fn expose(&self) -> &str {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Debug for SessionToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("SessionToken").field(&REDACTED).finish()
	}
}

impl fmt::Display for SessionToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}
