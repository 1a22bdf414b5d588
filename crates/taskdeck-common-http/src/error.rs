// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Normalization of transport and server failures into [`ClassifiedError`].
//!
//! Every failed attempt made by the resilient client passes through this
//! module exactly once. Downstream code branches on [`ErrorKind`], the HTTP
//! status, the envelope `error` code and the structured field errors; it never
//! inspects message text.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::transport::TransportError;

/// Retry-relevant category of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	/// No response was received (DNS failure, refused connection, reset).
	Network,
	/// The per-request timeout elapsed before a response arrived.
	Timeout,
	/// The server answered with a 4xx status.
	ClientError,
	/// The server answered with a 5xx status.
	ServerError,
	/// Malformed or unexpected response.
	Unknown,
}

impl ErrorKind {
	/// Default retry eligibility for this kind.
	pub fn is_retryable(self) -> bool {
		matches!(
			self,
			ErrorKind::Network | ErrorKind::Timeout | ErrorKind::ServerError
		)
	}
}

/// A single per-field validation message from the response `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
	pub msg: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub path: Option<String>,
}

impl FieldError {
	/// Extracts a field error from a loosely shaped JSON entry.
	///
	/// Accepts `msg` or `message` for the text and `path` or `param` for the
	/// field name. Entries without any text are skipped.
	pub fn from_value(value: &Value) -> Option<Self> {
		let msg = value
			.get("msg")
			.or_else(|| value.get("message"))
			.and_then(Value::as_str)?;
		let path = value
			.get("path")
			.or_else(|| value.get("param"))
			.and_then(Value::as_str)
			.filter(|p| !p.is_empty())
			.map(str::to_string);
		Some(Self {
			msg: msg.to_string(),
			path,
		})
	}

	/// Collects every recognizable entry of an `errors` array.
	pub fn collect(errors: Option<&Value>) -> Vec<Self> {
		errors
			.and_then(Value::as_array)
			.map(|entries| entries.iter().filter_map(Self::from_value).collect())
			.unwrap_or_default()
	}
}

impl std::fmt::Display for FieldError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &self.path {
			Some(path) => write!(f, "{} ({})", self.msg, path),
			None => f.write_str(&self.msg),
		}
	}
}

/// A normalized request failure. Immutable once created.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ClassifiedError {
	kind: ErrorKind,
	status_code: Option<u16>,
	message: String,
	retryable: bool,
	code: Option<String>,
	field_errors: Vec<FieldError>,
}

impl ClassifiedError {
	fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
		Self {
			kind,
			status_code: None,
			message: message.into(),
			retryable: kind.is_retryable(),
			code: None,
			field_errors: Vec::new(),
		}
	}

	/// A failure before any response was received.
	pub fn network(detail: impl std::fmt::Display) -> Self {
		Self::new(ErrorKind::Network, format!("Network error: {detail}"))
	}

	/// The request was aborted after exceeding `after`.
	pub fn timeout(after: Duration) -> Self {
		Self::new(
			ErrorKind::Timeout,
			format!("Request timed out after {}ms", after.as_millis()),
		)
	}

	/// A response that could not be understood.
	pub fn unknown(detail: impl Into<String>) -> Self {
		Self::new(ErrorKind::Unknown, detail)
	}

	/// Maps a transport-level failure.
	///
	/// Failing to read the body of a response that did arrive is a malformed
	/// response, not a network failure; neither is a request that could not
	/// be built.
	pub fn from_transport(err: &TransportError) -> Self {
		match err {
			TransportError::Connect(_) | TransportError::Request(_) => Self::network(err),
			TransportError::Invalid(_) | TransportError::Body(_) => Self::unknown(err.to_string()),
		}
	}

	/// Classifies a non-2xx response from its status and raw body.
	pub fn from_response(status: StatusCode, body: &str) -> Self {
		let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);
		let kind = if status.is_client_error() {
			ErrorKind::ClientError
		} else if status.is_server_error() {
			ErrorKind::ServerError
		} else {
			ErrorKind::Unknown
		};

		Self {
			kind,
			status_code: Some(status.as_u16()),
			message: describe_failure(status.as_u16(), &parsed),
			retryable: kind.is_retryable(),
			code: parsed
				.get("error")
				.and_then(Value::as_str)
				.map(str::to_string),
			field_errors: FieldError::collect(parsed.get("errors")),
		}
	}

	pub fn kind(&self) -> ErrorKind {
		self.kind
	}

	pub fn status_code(&self) -> Option<u16> {
		self.status_code
	}

	pub fn message(&self) -> &str {
		&self.message
	}

	pub fn retryable(&self) -> bool {
		self.retryable
	}

	/// The machine-readable `error` code from the response envelope, if any.
	pub fn code(&self) -> Option<&str> {
		self.code.as_deref()
	}

	pub fn field_errors(&self) -> &[FieldError] {
		&self.field_errors
	}

	pub fn is_client_error(&self) -> bool {
		self.kind == ErrorKind::ClientError
	}
}

/// Builds the human-readable message for a failed response body.
///
/// With an `errors` array: `"<message>: <msg> (<path>), ..."`, or just the
/// field list when there is no message. Otherwise the body `message`, then
/// the body `error`, then a generic status line.
pub(crate) fn describe_failure(status: u16, body: &Value) -> String {
	let message = body
		.get("message")
		.and_then(Value::as_str)
		.filter(|m| !m.is_empty());

	if body.get("errors").is_some_and(Value::is_array) {
		let fields = FieldError::collect(body.get("errors"))
			.iter()
			.map(ToString::to_string)
			.collect::<Vec<_>>()
			.join(", ");
		return match message {
			Some(message) if !fields.is_empty() => format!("{message}: {fields}"),
			Some(message) => message.to_string(),
			None if !fields.is_empty() => fields,
			None => format!("HTTP error! status: {status}"),
		};
	}

	message
		.or_else(|| {
			body
				.get("error")
				.and_then(Value::as_str)
				.filter(|e| !e.is_empty())
		})
		.map(str::to_string)
		.unwrap_or_else(|| format!("HTTP error! status: {status}"))
}
