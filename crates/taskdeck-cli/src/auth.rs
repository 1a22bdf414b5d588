// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use tracing::{info, instrument};

use taskdeck_client::{
	ClientContext, LoginRequest, ProfileUpdateRequest, RegisterRequest, SessionFailure,
	SessionStatus,
};

/// Arguments of `taskdeck register`.
pub struct Registration {
	pub username: String,
	pub email: String,
	pub password: Option<String>,
	pub first_name: Option<String>,
	pub last_name: Option<String>,
}

fn prompt_password() -> Result<String> {
	eprint!("Password: ");
	io::stderr().flush().ok();

	let mut line = String::new();
	io::stdin()
		.lock()
		.read_line(&mut line)
		.context("failed to read password")?;
	let password = line.trim_end_matches(['\r', '\n']).to_string();
	if password.is_empty() {
		bail!("a password is required");
	}
	Ok(password)
}

/// Prints field-level problems, then hands the failure to anyhow.
fn report(failure: SessionFailure) -> anyhow::Error {
	for field in &failure.validation_errors {
		eprintln!("  - {field}");
	}
	anyhow::Error::new(failure)
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.filter(|v| !v.trim().is_empty())
}

#[instrument(skip_all)]
pub async fn login(context: &ClientContext, email: String, password: Option<String>) -> Result<()> {
	let password = match password {
		Some(password) => password,
		None => prompt_password()?,
	};

	let response = context
		.session
		.login(&LoginRequest::new(email, password))
		.await
		.map_err(report)?;

	info!(user_id = response.data.id().unwrap_or_default(), "signed in");
	eprintln!("{}", response.message);
	if let Some(name) = response.data.display_name() {
		eprintln!("Welcome, {name}.");
	}
	Ok(())
}

#[instrument(skip_all)]
pub async fn register(context: &ClientContext, registration: Registration) -> Result<()> {
	let password = match registration.password {
		Some(password) => password,
		None => prompt_password()?,
	};

	let request = RegisterRequest {
		username: registration.username,
		email: registration.email,
		password,
		first_name: non_empty(registration.first_name),
		last_name: non_empty(registration.last_name),
	};
	let response = context.session.register(&request).await.map_err(report)?;

	eprintln!("{}", response.message);
	Ok(())
}

pub async fn logout(context: &ClientContext) -> Result<()> {
	let response = context.session.logout().await.map_err(report)?;
	eprintln!("{}", response.message);
	Ok(())
}

pub async fn status(context: &ClientContext) -> Result<()> {
	match context.session.status().await {
		SessionStatus::Authenticated => {
			let user = context.session.current_user().await;
			let who = user
				.as_ref()
				.and_then(|u| u.email().map(str::to_string).or_else(|| u.display_name()))
				.unwrap_or_else(|| "unknown user".to_string());
			println!("Signed in as {who}");
		}
		SessionStatus::Authenticating => println!("Signing in"),
		SessionStatus::Unauthenticated => println!("Not signed in"),
	}
	Ok(())
}

pub async fn show_profile(context: &ClientContext) -> Result<()> {
	let response = context.session.get_profile().await.map_err(report)?;
	println!(
		"{}",
		serde_json::to_string_pretty(response.data.as_map()).context("failed to render profile")?
	);
	Ok(())
}

pub async fn update_profile(
	context: &ClientContext,
	first_name: Option<String>,
	last_name: Option<String>,
	avatar: Option<String>,
) -> Result<()> {
	let patch = ProfileUpdateRequest {
		first_name,
		last_name,
		avatar,
	};
	if patch.is_empty() {
		bail!("nothing to update; pass --first-name, --last-name or --avatar");
	}

	let response = context.session.update_profile(&patch).await.map_err(report)?;
	eprintln!("{}", response.message);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn blank_optional_names_are_dropped() {
		assert_eq!(non_empty(Some("  ".into())), None);
		assert_eq!(non_empty(Some("Ada".into())), Some("Ada".to_string()));
		assert_eq!(non_empty(None), None);
	}

	#[test]
	fn failures_keep_their_message() {
		let failure = SessionFailure::from_reason(taskdeck_client::FailureReason::SessionExpired);
		let err = report(failure);
		assert_eq!(err.to_string(), "Session expired. Please log in again.");
		assert!(err.downcast_ref::<SessionFailure>().is_some());
	}
}
