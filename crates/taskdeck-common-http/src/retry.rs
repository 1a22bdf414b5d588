// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Bounded retry with pure exponential backoff.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ClassifiedError;

/// Attempt budget and backoff schedule for one class of operations.
///
/// Attempts are numbered from 1. After failed attempt `n` the loop waits
/// `base_delay * 2^(n-1)` before attempt `n + 1`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
	max_attempts: u32,
	base_delay: Duration,
	is_retryable: fn(&ClassifiedError) -> bool,
}

impl RetryPolicy {
	pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

	/// Creates a policy; `max_attempts` is clamped to at least one.
	pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
		Self {
			max_attempts: max_attempts.max(1),
			base_delay,
			is_retryable: ClassifiedError::retryable,
		}
	}

	/// Default for idempotent reads: three attempts.
	pub fn reads() -> Self {
		Self::new(3, Self::DEFAULT_BASE_DELAY)
	}

	/// Default for mutations: two attempts.
	pub fn mutations() -> Self {
		Self::new(2, Self::DEFAULT_BASE_DELAY)
	}

	/// A policy that never retries.
	pub fn once() -> Self {
		Self::new(1, Duration::ZERO)
	}

	/// Replaces the retry predicate. Client errors stay terminal regardless.
	pub fn with_classifier(mut self, is_retryable: fn(&ClassifiedError) -> bool) -> Self {
		self.is_retryable = is_retryable;
		self
	}

	pub fn max_attempts(&self) -> u32 {
		self.max_attempts
	}

	pub fn base_delay(&self) -> Duration {
		self.base_delay
	}

	/// Backoff to wait after failed attempt `attempt` (1-based).
	pub fn delay_for(&self, attempt: u32) -> Duration {
		let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
		self.base_delay.saturating_mul(factor)
	}

	fn permits_retry(&self, err: &ClassifiedError) -> bool {
		!err.is_client_error() && (self.is_retryable)(err)
	}
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self::reads()
	}
}

/// Runs `f` until it succeeds, fails terminally, or the policy is exhausted.
///
/// `f` receives the 1-based attempt number. The last error is returned when
/// the loop gives up.
pub async fn retry<F, Fut, T>(policy: &RetryPolicy, mut f: F) -> Result<T, ClassifiedError>
where
	F: FnMut(u32) -> Fut,
	Fut: Future<Output = Result<T, ClassifiedError>>,
{
	let mut attempt = 1;

	loop {
		match f(attempt).await {
			Ok(result) => return Ok(result),
			Err(err) => {
				if !policy.permits_retry(&err) {
					debug!(
						error = %err,
						kind = ?err.kind(),
						status = ?err.status_code(),
						attempt = attempt,
						"non-retryable error encountered"
					);
					return Err(err);
				}

				if attempt >= policy.max_attempts {
					warn!(
						error = %err,
						kind = ?err.kind(),
						attempt = attempt,
						max_attempts = policy.max_attempts,
						"max retry attempts exhausted"
					);
					return Err(err);
				}

				let delay = policy.delay_for(attempt);
				warn!(
					error = %err,
					kind = ?err.kind(),
					attempt = attempt,
					max_attempts = policy.max_attempts,
					delay_ms = delay.as_millis() as u64,
					"retrying after error"
				);

				tokio::time::sleep(delay).await;
				attempt += 1;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use reqwest::StatusCode;
	use std::sync::atomic::{AtomicU32, Ordering};
	use std::sync::{Arc, Mutex};
	use tokio::time::Instant;

	fn server_error() -> ClassifiedError {
		ClassifiedError::from_response(StatusCode::INTERNAL_SERVER_ERROR, "{}")
	}

	#[tokio::test]
	async fn client_error_fails_immediately() {
		let attempts = Arc::new(AtomicU32::new(0));
		let counter = Arc::clone(&attempts);

		let result: Result<(), _> = retry(&RetryPolicy::reads(), |_| {
			let count = Arc::clone(&counter);
			async move {
				count.fetch_add(1, Ordering::SeqCst);
				Err(ClassifiedError::from_response(StatusCode::NOT_FOUND, "{}"))
			}
		})
		.await;

		assert_eq!(result.unwrap_err().status_code(), Some(404));
		assert_eq!(attempts.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn classifier_cannot_make_client_errors_retryable() {
		let attempts = Arc::new(AtomicU32::new(0));
		let counter = Arc::clone(&attempts);
		let policy = RetryPolicy::new(5, Duration::from_millis(1)).with_classifier(|_| true);

		let _: Result<(), _> = retry(&policy, |_| {
			let count = Arc::clone(&counter);
			async move {
				count.fetch_add(1, Ordering::SeqCst);
				Err(ClassifiedError::from_response(StatusCode::CONFLICT, "{}"))
			}
		})
		.await;

		assert_eq!(attempts.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn unknown_errors_are_not_retried_by_default() {
		let attempts = Arc::new(AtomicU32::new(0));
		let counter = Arc::clone(&attempts);

		let _: Result<(), _> = retry(&RetryPolicy::new(3, Duration::from_millis(1)), |_| {
			let count = Arc::clone(&counter);
			async move {
				count.fetch_add(1, Ordering::SeqCst);
				Err(ClassifiedError::unknown("garbled"))
			}
		})
		.await;

		assert_eq!(attempts.load(Ordering::SeqCst), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn server_errors_retry_with_exponential_backoff() {
		let starts = Arc::new(Mutex::new(Vec::new()));
		let recorder = Arc::clone(&starts);
		let policy = RetryPolicy::new(3, Duration::from_millis(1000));
		let origin = Instant::now();

		let result: Result<(), _> = retry(&policy, |attempt| {
			let starts = Arc::clone(&recorder);
			async move {
				starts.lock().unwrap().push((attempt, origin.elapsed()));
				Err(server_error())
			}
		})
		.await;

		assert_eq!(result.unwrap_err().status_code(), Some(500));
		let starts = starts.lock().unwrap();
		assert_eq!(starts.len(), 3);
		assert_eq!(
			starts.iter().map(|(n, _)| *n).collect::<Vec<_>>(),
			vec![1, 2, 3]
		);
		let gap_1 = starts[1].1 - starts[0].1;
		let gap_2 = starts[2].1 - starts[1].1;
		assert!(gap_1 >= Duration::from_millis(1000) && gap_1 < Duration::from_millis(1100));
		assert!(gap_2 >= Duration::from_millis(2000) && gap_2 < Duration::from_millis(2100));
	}

	#[tokio::test]
	async fn succeeds_after_transient_failures() {
		let attempts = Arc::new(AtomicU32::new(0));
		let counter = Arc::clone(&attempts);
		let policy = RetryPolicy::new(5, Duration::from_millis(1));

		let result = retry(&policy, |_| {
			let count = Arc::clone(&counter);
			async move {
				if count.fetch_add(1, Ordering::SeqCst) < 2 {
					Err(ClassifiedError::network("connection reset"))
				} else {
					Ok("success")
				}
			}
		})
		.await;

		assert_eq!(result.unwrap(), "success");
		assert_eq!(attempts.load(Ordering::SeqCst), 3);
	}

	#[test]
	fn delay_doubles_per_attempt() {
		let policy = RetryPolicy::new(4, Duration::from_millis(1000));
		assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
		assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
		assert_eq!(policy.delay_for(3), Duration::from_millis(4000));
	}

	#[test]
	fn delay_saturates_instead_of_overflowing() {
		let policy = RetryPolicy::new(100, Duration::from_secs(1));
		assert_eq!(policy.delay_for(64), Duration::from_secs(u64::from(u32::MAX)));
	}

	#[test]
	fn max_attempts_is_at_least_one() {
		assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
		assert!(RetryPolicy::reads().max_attempts() > RetryPolicy::mutations().max_attempts());
	}
}
