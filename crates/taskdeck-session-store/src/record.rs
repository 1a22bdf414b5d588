// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::token::SessionToken;

/// The authenticated user as returned by the remote service.
///
/// Treated as an opaque JSON object: the core reads `id` and a display name
/// and otherwise only round-trips and shallow-merges it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(Map<String, Value>);

impl UserProfile {
	pub fn new(fields: Map<String, Value>) -> Self {
		Self(fields)
	}

	/// Builds a profile from a JSON value; `None` unless it is an object.
	pub fn from_value(value: Value) -> Option<Self> {
		match value {
			Value::Object(fields) => Some(Self(fields)),
			_ => None,
		}
	}

	pub fn id(&self) -> Option<&str> {
		self
			.0
			.get("id")
			.or_else(|| self.0.get("_id"))
			.and_then(Value::as_str)
	}

	pub fn username(&self) -> Option<&str> {
		self.field_str("username")
	}

	pub fn email(&self) -> Option<&str> {
		self.field_str("email")
	}

	/// `firstName lastName` when present, otherwise the username.
	pub fn display_name(&self) -> Option<String> {
		let full = [self.field_str("firstName"), self.field_str("lastName")]
			.into_iter()
			.flatten()
			.filter(|part| !part.is_empty())
			.collect::<Vec<_>>()
			.join(" ");
		if full.is_empty() {
			self.username().map(str::to_string)
		} else {
			Some(full)
		}
	}

	pub fn get(&self, field: &str) -> Option<&Value> {
		self.0.get(field)
	}

	/// Shallow merge: top-level fields of `update` replace ours.
	pub fn merge(&mut self, update: &UserProfile) {
		for (key, value) in &update.0 {
			self.0.insert(key.clone(), value.clone());
		}
	}

	pub fn merged(mut self, update: &UserProfile) -> Self {
		self.merge(update);
		self
	}

	pub fn as_map(&self) -> &Map<String, Value> {
		&self.0
	}

	fn field_str(&self, field: &str) -> Option<&str> {
		self.0.get(field).and_then(Value::as_str)
	}
}

/// Proof of authentication: user, bearer token and the client-side issue time.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
	user: UserProfile,
	token: SessionToken,
	/// Raw persisted timestamp. Kept unparsed so corrupt values survive a
	/// load and are rejected by the validity check instead of the parser.
	timestamp: Value,
}

impl SessionRecord {
	pub fn new(user: UserProfile, token: SessionToken, issued_at: DateTime<Utc>) -> Self {
		Self {
			user,
			token,
			timestamp: Value::from(issued_at.timestamp_millis()),
		}
	}

	pub fn user(&self) -> &UserProfile {
		&self.user
	}

	pub fn token(&self) -> &SessionToken {
		&self.token
	}

	/// The issue time, or `None` when the stored timestamp is not a finite
	/// millisecond count (number or numeric string) or an RFC 3339 string.
	pub fn issued_at(&self) -> Option<DateTime<Utc>> {
		match &self.timestamp {
			Value::Number(n) => n.as_f64().and_then(millis_to_datetime),
			Value::String(s) => {
				let s = s.trim();
				match s.parse::<f64>() {
					Ok(ms) => millis_to_datetime(ms),
					Err(_) => DateTime::parse_from_rfc3339(s)
						.ok()
						.map(|dt| dt.with_timezone(&Utc)),
				}
			}
			_ => None,
		}
	}
}

fn millis_to_datetime(ms: f64) -> Option<DateTime<Utc>> {
	if !ms.is_finite() || ms.abs() > i64::MAX as f64 {
		return None;
	}
	DateTime::from_timestamp_millis(ms as i64)
}

/// On-disk representation, stored under a single key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedSession {
	pub user: UserProfile,
	pub token: String,
	#[serde(default)]
	pub timestamp: Value,
}

impl From<PersistedSession> for SessionRecord {
	fn from(persisted: PersistedSession) -> Self {
		Self {
			user: persisted.user,
			token: SessionToken::new(persisted.token),
			timestamp: persisted.timestamp,
		}
	}
}

impl From<&SessionRecord> for PersistedSession {
	fn from(record: &SessionRecord) -> Self {
		Self {
			user: record.user.clone(),
			token: record.token.expose().to_string(),
			timestamp: record.timestamp.clone(),
		}
	}
}
