// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire types of the authentication endpoints.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use taskdeck_common_http::FieldError;

/// Body of `POST /auth/login`.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
	pub email: String,
	pub password: String,
}

impl LoginRequest {
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			email: email.into(),
			password: password.into(),
		}
	}
}

impl fmt::Debug for LoginRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LoginRequest")
			.field("email", &self.email)
			.field("password", &"[REDACTED]")
			.finish()
	}
}

/// Body of `POST /auth/register`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
	pub username: String,
	pub email: String,
	pub password: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub first_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_name: Option<String>,
}

impl fmt::Debug for RegisterRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RegisterRequest")
			.field("username", &self.username)
			.field("email", &self.email)
			.field("password", &"[REDACTED]")
			.field("first_name", &self.first_name)
			.field("last_name", &self.last_name)
			.finish()
	}
}

/// Body of `PUT /auth/profile`. Unset fields are left unchanged server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub first_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub avatar: Option<String>,
}

impl ProfileUpdateRequest {
	pub fn is_empty(&self) -> bool {
		self.first_name.is_none() && self.last_name.is_none() && self.avatar.is_none()
	}
}

/// `data` of an authentication envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthPayload {
	#[serde(default)]
	pub user: Option<Value>,
	#[serde(default)]
	pub token: Option<String>,
}

/// The response envelope shared by every authentication endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
	#[serde(default)]
	pub success: bool,
	#[serde(default)]
	pub message: Option<String>,
	#[serde(default)]
	pub data: Option<T>,
	#[serde(default)]
	pub error: Option<String>,
	#[serde(default)]
	pub errors: Vec<Value>,
}

impl<T> Envelope<T> {
	pub fn field_errors(&self) -> Vec<FieldError> {
		self.errors.iter().filter_map(FieldError::from_value).collect()
	}
}
