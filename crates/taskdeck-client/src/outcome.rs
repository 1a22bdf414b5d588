// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The uniform result type of [`crate::SessionService`].

use serde::{Deserialize, Serialize};
use taskdeck_common_http::FieldError;

/// Closed vocabulary of session failure causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
	InvalidCredentials,
	AccountDeactivated,
	ServiceUnavailable,
	ValidationError,
	UserExists,
	InvalidData,
	NetworkError,
	TimeoutError,
	SessionExpired,
	UnknownError,
}

impl FailureReason {
	pub fn as_str(self) -> &'static str {
		match self {
			FailureReason::InvalidCredentials => "invalid_credentials",
			FailureReason::AccountDeactivated => "account_deactivated",
			FailureReason::ServiceUnavailable => "service_unavailable",
			FailureReason::ValidationError => "validation_error",
			FailureReason::UserExists => "user_exists",
			FailureReason::InvalidData => "invalid_data",
			FailureReason::NetworkError => "network_error",
			FailureReason::TimeoutError => "timeout_error",
			FailureReason::SessionExpired => "session_expired",
			FailureReason::UnknownError => "unknown_error",
		}
	}

	/// User-presentable message used when the server supplies none worth showing.
	pub fn default_message(self) -> &'static str {
		match self {
			FailureReason::InvalidCredentials => "Invalid email or password. Please try again.",
			FailureReason::AccountDeactivated => {
				"Your account has been deactivated. Please contact support."
			}
			FailureReason::ServiceUnavailable => {
				"Service temporarily unavailable. Please try again in a few moments."
			}
			FailureReason::ValidationError => "Please check your inputs and try again.",
			FailureReason::UserExists => "User already exists with this email or username",
			FailureReason::InvalidData => "Invalid data. Please check your inputs.",
			FailureReason::NetworkError => {
				"Network connection failed. Please check your internet connection and try again."
			}
			FailureReason::TimeoutError => "Request timed out. Please try again.",
			FailureReason::SessionExpired => "Session expired. Please log in again.",
			FailureReason::UnknownError => "An unexpected error occurred. Please try again.",
		}
	}
}

impl std::fmt::Display for FailureReason {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A declined or failed session operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize)]
#[error("{message}")]
pub struct SessionFailure {
	pub reason: FailureReason,
	pub message: String,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub validation_errors: Vec<FieldError>,
}

impl SessionFailure {
	pub fn new(reason: FailureReason, message: impl Into<String>) -> Self {
		Self {
			reason,
			message: message.into(),
			validation_errors: Vec::new(),
		}
	}

	/// A failure carrying the reason's default message.
	pub fn from_reason(reason: FailureReason) -> Self {
		Self::new(reason, reason.default_message())
	}

	pub fn with_validation_errors(mut self, errors: Vec<FieldError>) -> Self {
		self.validation_errors = errors;
		self
	}
}

/// A successful session operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionResponse<T> {
	pub message: String,
	pub data: T,
}

impl<T> SessionResponse<T> {
	pub fn new(message: impl Into<String>, data: T) -> Self {
		Self {
			message: message.into(),
			data,
		}
	}
}

pub type SessionResult<T> = Result<SessionResponse<T>, SessionFailure>;
