// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Resilient HTTP plumbing for Taskdeck.
//!
//! This crate provides:
//! - A pre-configured reqwest client with a consistent User-Agent header
//! - [`ClassifiedError`], the single failure taxonomy for remote calls
//! - [`RetryPolicy`] and a bounded exponential-backoff retry loop
//! - [`ResilientHttpClient`], which combines the above with per-request
//!   timeouts and credential attachment through [`AuthHeaderSource`]

mod client;
mod error;
mod resilient;
mod retry;
mod transport;

pub use client::{builder, user_agent};
pub use error::{ClassifiedError, ErrorKind, FieldError};
pub use resilient::{
	AuthHeaderSource, BuildError, NoAuth, RequestProfile, ResilientHttpClient,
	ResilientHttpClientBuilder, ResponseBody,
};
pub use retry::{retry, RetryPolicy};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};

pub use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
pub use reqwest::Method;
