// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Login, registration, logout and profile management.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use taskdeck_common_http::{ClassifiedError, ErrorKind, FieldError, ResilientHttpClient};
use taskdeck_session_store::{SessionRecord, SessionStore, SessionToken, UserProfile};
use tracing::{debug, info, instrument, warn};

use crate::outcome::{FailureReason, SessionFailure, SessionResponse, SessionResult};
use crate::types::{AuthPayload, Envelope, LoginRequest, ProfileUpdateRequest, RegisterRequest};

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";
const LOGOUT_PATH: &str = "/auth/logout";
const PROFILE_PATH: &str = "/auth/profile";

/// Coarse authentication state of a [`SessionService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
	Unauthenticated,
	/// A login or registration is in flight.
	Authenticating,
	Authenticated,
}

/// Which call a failure came from; a 401 means different things to each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
	Login,
	Register,
	Profile,
}

impl Operation {
	fn unauthorized_reason(self) -> FailureReason {
		match self {
			Operation::Login => FailureReason::InvalidCredentials,
			Operation::Profile => FailureReason::SessionExpired,
			Operation::Register => FailureReason::UnknownError,
		}
	}
}

/// Maps a machine-readable envelope code onto a reason, if it names one.
fn reason_for_code(code: &str) -> Option<FailureReason> {
	match code {
		"database_unavailable" | "service_unavailable" => Some(FailureReason::ServiceUnavailable),
		"username_exists" | "email_exists" | "user_exists" => Some(FailureReason::UserExists),
		"validation_error" => Some(FailureReason::ValidationError),
		"invalid_credentials" => Some(FailureReason::InvalidCredentials),
		"account_deactivated" => Some(FailureReason::AccountDeactivated),
		_ => None,
	}
}

fn classify(operation: Operation, err: &ClassifiedError) -> FailureReason {
	match err.kind() {
		ErrorKind::Network => return FailureReason::NetworkError,
		ErrorKind::Timeout => return FailureReason::TimeoutError,
		_ => {}
	}

	// A rejected token ends the session whatever the body claims.
	if operation == Operation::Profile && err.status_code() == Some(401) {
		return FailureReason::SessionExpired;
	}

	if let Some(reason) = err.code().and_then(reason_for_code) {
		return reason;
	}

	if err.kind() == ErrorKind::ServerError {
		return FailureReason::ServiceUnavailable;
	}

	match err.status_code() {
		Some(401) => return operation.unauthorized_reason(),
		Some(403) => return FailureReason::AccountDeactivated,
		Some(409) => return FailureReason::UserExists,
		Some(400) | Some(422) => {
			return if err.field_errors().is_empty() {
				FailureReason::InvalidData
			} else {
				FailureReason::ValidationError
			};
		}
		_ => {}
	}

	if err.field_errors().is_empty() {
		FailureReason::UnknownError
	} else {
		FailureReason::ValidationError
	}
}

/// Reasons whose server-supplied message is shown verbatim.
fn uses_server_message(reason: FailureReason) -> bool {
	matches!(
		reason,
		FailureReason::ValidationError | FailureReason::UserExists
	)
}

fn failure(reason: FailureReason, server_message: Option<&str>, field_errors: Vec<FieldError>) -> SessionFailure {
	let message = match server_message.map(str::trim) {
		Some(message) if uses_server_message(reason) && !message.is_empty() => message.to_string(),
		_ => reason.default_message().to_string(),
	};
	SessionFailure::new(reason, message).with_validation_errors(field_errors)
}

fn failure_from_error(operation: Operation, err: &ClassifiedError) -> SessionFailure {
	let reason = classify(operation, err);
	failure(reason, Some(err.message()), err.field_errors().to_vec())
}

/// A 2xx envelope with `success: false`.
fn failure_from_rejection<T>(operation: Operation, envelope: &Envelope<T>) -> SessionFailure {
	let field_errors = envelope.field_errors();
	let reason = envelope
		.error
		.as_deref()
		.and_then(reason_for_code)
		.unwrap_or(if field_errors.is_empty() {
			match operation {
				Operation::Profile => FailureReason::UnknownError,
				_ => FailureReason::InvalidData,
			}
		} else {
			FailureReason::ValidationError
		});
	failure(reason, envelope.message.as_deref(), field_errors)
}

/// Decrements the in-flight counter when the authenticating call ends,
/// including when its future is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
	fn enter(counter: &'a AtomicUsize) -> Self {
		counter.fetch_add(1, Ordering::SeqCst);
		Self(counter)
	}
}

impl Drop for InFlight<'_> {
	fn drop(&mut self) {
		self.0.fetch_sub(1, Ordering::SeqCst);
	}
}

/// Facade over the authentication endpoints.
///
/// Every operation resolves to a [`SessionResult`]; no transport error
/// crosses this boundary. The store is written only after a structurally
/// successful login, registration or profile refresh, and cleared on logout
/// or when the server reports the session as unauthorized.
#[derive(Debug)]
pub struct SessionService {
	http: Arc<ResilientHttpClient>,
	store: Arc<SessionStore>,
	authenticating: AtomicUsize,
}

impl SessionService {
	/// `http` is expected to attach credentials from `store`, typically via
	/// [`taskdeck_session_store::AuthContextProvider`].
	pub fn new(http: Arc<ResilientHttpClient>, store: Arc<SessionStore>) -> Self {
		Self {
			http,
			store,
			authenticating: AtomicUsize::new(0),
		}
	}

	pub fn store(&self) -> &Arc<SessionStore> {
		&self.store
	}

	#[instrument(skip_all)]
	pub async fn login(&self, credentials: &LoginRequest) -> SessionResult<UserProfile> {
		let _in_flight = InFlight::enter(&self.authenticating);
		let outcome = self
			.http
			.post::<Envelope<AuthPayload>, _>(LOGIN_PATH, credentials)
			.await;
		self.establish(Operation::Login, outcome, "Login successful").await
	}

	#[instrument(skip_all)]
	pub async fn register(&self, details: &RegisterRequest) -> SessionResult<UserProfile> {
		let _in_flight = InFlight::enter(&self.authenticating);
		let outcome = self
			.http
			.post::<Envelope<AuthPayload>, _>(REGISTER_PATH, details)
			.await;
		self
			.establish(Operation::Register, outcome, "Registration successful")
			.await
	}

	/// Notifies the server when a session exists, then clears local state.
	/// Always succeeds.
	#[instrument(skip_all)]
	pub async fn logout(&self) -> SessionResult<()> {
		if self.is_authenticated().await {
			if let Err(e) = self.http.post_empty::<Value>(LOGOUT_PATH).await {
				warn!(error = %e, kind = ?e.kind(), "logout request failed, clearing local session anyway");
			}
		}

		self.store.clear().await;
		info!("logged out");
		Ok(SessionResponse::new("Logged out successfully", ()))
	}

	#[instrument(skip_all)]
	pub async fn get_profile(&self) -> SessionResult<UserProfile> {
		let outcome = self.http.get::<Envelope<AuthPayload>>(PROFILE_PATH).await;
		self.refresh_profile(outcome, "Profile loaded").await
	}

	#[instrument(skip_all)]
	pub async fn update_profile(&self, patch: &ProfileUpdateRequest) -> SessionResult<UserProfile> {
		let outcome = self
			.http
			.put::<Envelope<AuthPayload>, _>(PROFILE_PATH, patch)
			.await;
		self.refresh_profile(outcome, "Profile updated").await
	}

	pub async fn is_authenticated(&self) -> bool {
		self.store.state().await.is_authenticated
	}

	pub async fn current_user(&self) -> Option<UserProfile> {
		self.store.state().await.user
	}

	pub async fn token(&self) -> Option<SessionToken> {
		self.store.state().await.token
	}

	pub async fn status(&self) -> SessionStatus {
		if self.authenticating.load(Ordering::SeqCst) > 0 {
			SessionStatus::Authenticating
		} else if self.is_authenticated().await {
			SessionStatus::Authenticated
		} else {
			SessionStatus::Unauthenticated
		}
	}

	async fn establish(
		&self,
		operation: Operation,
		outcome: Result<Envelope<AuthPayload>, ClassifiedError>,
		default_message: &str,
	) -> SessionResult<UserProfile> {
		let envelope = match outcome {
			Ok(envelope) => envelope,
			Err(e) => {
				let failure = failure_from_error(operation, &e);
				warn!(reason = %failure.reason, kind = ?e.kind(), status = ?e.status_code(), "authentication failed");
				return Err(failure);
			}
		};

		if !envelope.success {
			let failure = failure_from_rejection(operation, &envelope);
			warn!(reason = %failure.reason, "authentication rejected");
			return Err(failure);
		}

		let message = envelope
			.message
			.clone()
			.unwrap_or_else(|| default_message.to_string());
		let payload = envelope.data.unwrap_or_default();
		let user = payload.user.and_then(UserProfile::from_value);
		let token = payload
			.token
			.filter(|token| !token.is_empty())
			.map(SessionToken::new);

		let (Some(user), Some(token)) = (user, token) else {
			warn!("authentication response is missing user or token");
			return Err(SessionFailure::from_reason(FailureReason::UnknownError));
		};

		self
			.store
			.save(&SessionRecord::new(user.clone(), token, Utc::now()))
			.await;
		info!(user_id = ?user.id(), "session established");
		Ok(SessionResponse::new(message, user))
	}

	async fn refresh_profile(
		&self,
		outcome: Result<Envelope<AuthPayload>, ClassifiedError>,
		default_message: &str,
	) -> SessionResult<UserProfile> {
		let envelope = match outcome {
			Ok(envelope) => envelope,
			Err(e) => {
				let failure = failure_from_error(Operation::Profile, &e);
				if failure.reason == FailureReason::SessionExpired {
					info!("server rejected session, clearing");
					self.store.clear().await;
				} else {
					warn!(reason = %failure.reason, kind = ?e.kind(), status = ?e.status_code(), "profile request failed");
				}
				return Err(failure);
			}
		};

		if !envelope.success {
			return Err(failure_from_rejection(Operation::Profile, &envelope));
		}

		let message = envelope
			.message
			.clone()
			.unwrap_or_else(|| default_message.to_string());
		let Some(update) = envelope
			.data
			.and_then(|payload| payload.user)
			.and_then(UserProfile::from_value)
		else {
			warn!("profile response is missing user");
			return Err(SessionFailure::from_reason(FailureReason::UnknownError));
		};

		match self.store.load().await {
			Some(record) if self.store.is_valid(&record, Utc::now()) => {
				let merged = record.user().clone().merged(&update);
				self
					.store
					.save(&SessionRecord::new(merged.clone(), record.token().clone(), Utc::now()))
					.await;
				debug!("stored profile refreshed");
				Ok(SessionResponse::new(message, merged))
			}
			_ => {
				debug!("no active session, profile not stored");
				Ok(SessionResponse::new(message, update))
			}
		}
	}
}
