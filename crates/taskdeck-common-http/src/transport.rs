// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Single-attempt HTTP transport.
//!
//! The resilient client owns timeouts and retries; a [`Transport`] performs
//! exactly one exchange and reports what happened.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::trace;

/// A fully resolved outgoing request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
	pub method: Method,
	pub url: String,
	pub headers: HeaderMap,
	pub body: Option<Value>,
}

/// A received response with its body already read.
#[derive(Debug, Clone)]
pub struct HttpResponse {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: String,
}

impl HttpResponse {
	/// Whether the response declares a JSON content type.
	pub fn is_json(&self) -> bool {
		self
			.headers
			.get(reqwest::header::CONTENT_TYPE)
			.and_then(|v| v.to_str().ok())
			.is_some_and(|ct| ct.contains("application/json"))
	}
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
	/// The connection could not be established.
	#[error("failed to connect: {0}")]
	Connect(String),

	/// The request failed before a response was received.
	#[error("request failed: {0}")]
	Request(String),

	/// The request could not be built or its redirects were refused.
	#[error("invalid request: {0}")]
	Invalid(String),

	/// A response arrived but its body could not be read.
	#[error("failed to read response body: {0}")]
	Body(String),
}

/// Performs one HTTP exchange.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
	async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
	client: Client,
}

impl ReqwestTransport {
	/// Creates a transport with the standard Taskdeck User-Agent.
	pub fn new() -> Result<Self, reqwest::Error> {
		Ok(Self {
			client: crate::client::builder().build()?,
		})
	}

	pub fn with_client(client: Client) -> Self {
		Self { client }
	}
}

#[async_trait]
impl Transport for ReqwestTransport {
	async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
		trace!(method = %request.method, url = %request.url, "sending request");

		let mut builder = self
			.client
			.request(request.method, &request.url)
			.headers(request.headers);
		if let Some(body) = &request.body {
			builder = builder.json(body);
		}

		let response = builder.send().await.map_err(|e| {
			if e.is_connect() {
				TransportError::Connect(e.to_string())
			} else if e.is_builder() || e.is_redirect() {
				TransportError::Invalid(e.to_string())
			} else {
				TransportError::Request(e.to_string())
			}
		})?;

		let status = response.status();
		let headers = response.headers().clone();
		let body = response
			.text()
			.await
			.map_err(|e| TransportError::Body(e.to_string()))?;

		Ok(HttpResponse {
			status,
			headers,
			body,
		})
	}
}
