// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! HTTP client with per-request timeouts, bounded retry and credential
//! attachment.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::ClassifiedError;
use crate::retry::{retry, RetryPolicy};
use crate::transport::{HttpRequest, ReqwestTransport, Transport};

/// Supplies authorization headers for each outgoing attempt.
///
/// Implementations must re-derive the headers on every call so that a logout
/// or expiry between two attempts is observed.
#[async_trait]
pub trait AuthHeaderSource: Send + Sync {
	async fn headers(&self) -> HeaderMap;
}

/// Attaches no credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

#[async_trait]
impl AuthHeaderSource for NoAuth {
	async fn headers(&self) -> HeaderMap {
		HeaderMap::new()
	}
}

/// Timeout and retry policy applied to one class of requests.
#[derive(Debug, Clone, Copy)]
pub struct RequestProfile {
	pub timeout: Duration,
	pub retry: RetryPolicy,
}

impl RequestProfile {
	/// `GET` and `DELETE`: 10 second timeout, read retry policy.
	pub fn reads() -> Self {
		Self {
			timeout: Duration::from_secs(10),
			retry: RetryPolicy::reads(),
		}
	}

	/// `POST` and `PUT`: 15 second timeout, mutation retry policy.
	pub fn mutations() -> Self {
		Self {
			timeout: Duration::from_secs(15),
			retry: RetryPolicy::mutations(),
		}
	}
}

/// Body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
	Json(Value),
	Text(String),
}

impl ResponseBody {
	/// Converts to JSON; a text body becomes a JSON string.
	pub fn into_json(self) -> Value {
		match self {
			ResponseBody::Json(value) => value,
			ResponseBody::Text(text) => Value::String(text),
		}
	}

	/// Deserializes into `T`, classifying a shape mismatch as `Unknown`.
	pub fn deserialize<T: DeserializeOwned>(self) -> Result<T, ClassifiedError> {
		serde_json::from_value(self.into_json())
			.map_err(|e| ClassifiedError::unknown(format!("Unexpected response shape: {e}")))
	}
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
	#[error("base URL is required")]
	MissingBaseUrl,

	#[error("invalid base URL: {0}")]
	InvalidBaseUrl(String),

	#[error("failed to build HTTP client: {0}")]
	Client(#[from] reqwest::Error),
}

/// Builder for [`ResilientHttpClient`].
pub struct ResilientHttpClientBuilder {
	base_url: Option<String>,
	transport: Option<Arc<dyn Transport>>,
	auth: Arc<dyn AuthHeaderSource>,
	reads: RequestProfile,
	mutations: RequestProfile,
}

impl ResilientHttpClientBuilder {
	pub fn new() -> Self {
		Self {
			base_url: None,
			transport: None,
			auth: Arc::new(NoAuth),
			reads: RequestProfile::reads(),
			mutations: RequestProfile::mutations(),
		}
	}

	/// Sets the base endpoint, e.g. `http://localhost:5001/api`.
	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = Some(url.into());
		self
	}

	/// Overrides the transport. Defaults to [`ReqwestTransport`].
	pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	pub fn auth(mut self, auth: Arc<dyn AuthHeaderSource>) -> Self {
		self.auth = auth;
		self
	}

	pub fn read_profile(mut self, profile: RequestProfile) -> Self {
		self.reads = profile;
		self
	}

	pub fn mutation_profile(mut self, profile: RequestProfile) -> Self {
		self.mutations = profile;
		self
	}

	pub fn build(self) -> Result<ResilientHttpClient, BuildError> {
		let base_url = self.base_url.ok_or(BuildError::MissingBaseUrl)?;
		let base_url = base_url.trim().trim_end_matches('/').to_string();
		if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
			return Err(BuildError::InvalidBaseUrl(base_url));
		}

		let transport = match self.transport {
			Some(transport) => transport,
			None => Arc::new(ReqwestTransport::new()?),
		};

		Ok(ResilientHttpClient {
			base_url,
			transport,
			auth: self.auth,
			reads: self.reads,
			mutations: self.mutations,
		})
	}
}

impl Default for ResilientHttpClientBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Issues requests against a base endpoint with timeout, retry and
/// credential attachment. Never touches session storage.
pub struct ResilientHttpClient {
	base_url: String,
	transport: Arc<dyn Transport>,
	auth: Arc<dyn AuthHeaderSource>,
	reads: RequestProfile,
	mutations: RequestProfile,
}

impl std::fmt::Debug for ResilientHttpClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ResilientHttpClient")
			.field("base_url", &self.base_url)
			.field("transport", &self.transport)
			.field("reads", &self.reads)
			.field("mutations", &self.mutations)
			.finish()
	}
}

impl ResilientHttpClient {
	pub fn builder() -> ResilientHttpClientBuilder {
		ResilientHttpClientBuilder::new()
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	/// The default profile for a verb: `POST`/`PUT`/`PATCH` are mutations,
	/// everything else uses the read profile.
	pub fn profile_for(&self, method: &Method) -> &RequestProfile {
		if *method == Method::POST || *method == Method::PUT || *method == Method::PATCH {
			&self.mutations
		} else {
			&self.reads
		}
	}

	pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClassifiedError> {
		self.send(Method::GET, path, None).await?.deserialize()
	}

	pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClassifiedError> {
		self.send(Method::DELETE, path, None).await?.deserialize()
	}

	pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ClassifiedError>
	where
		T: DeserializeOwned,
		B: Serialize + ?Sized,
	{
		let body = to_json(body)?;
		self.send(Method::POST, path, Some(body)).await?.deserialize()
	}

	/// `POST` without a request body.
	pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClassifiedError> {
		self.send(Method::POST, path, None).await?.deserialize()
	}

	pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ClassifiedError>
	where
		T: DeserializeOwned,
		B: Serialize + ?Sized,
	{
		let body = to_json(body)?;
		self.send(Method::PUT, path, Some(body)).await?.deserialize()
	}

	/// Sends with the verb's default profile.
	pub async fn send(
		&self,
		method: Method,
		path: &str,
		body: Option<Value>,
	) -> Result<ResponseBody, ClassifiedError> {
		let profile = *self.profile_for(&method);
		self.send_with(method, path, body, &profile).await
	}

	/// Sends with an explicit timeout and retry policy.
	#[instrument(skip_all, fields(method = %method, path = %path))]
	pub async fn send_with(
		&self,
		method: Method,
		path: &str,
		body: Option<Value>,
		profile: &RequestProfile,
	) -> Result<ResponseBody, ClassifiedError> {
		let url = self.url_for(path);
		retry(&profile.retry, |attempt| {
			self.attempt(attempt, &method, &url, body.as_ref(), profile.timeout)
		})
		.await
	}

	fn url_for(&self, path: &str) -> String {
		if path.starts_with('/') {
			format!("{}{}", self.base_url, path)
		} else {
			format!("{}/{}", self.base_url, path)
		}
	}

	async fn attempt(
		&self,
		attempt: u32,
		method: &Method,
		url: &str,
		body: Option<&Value>,
		timeout: Duration,
	) -> Result<ResponseBody, ClassifiedError> {
		let mut headers = HeaderMap::new();
		if body.is_some() {
			headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		}
		headers.extend(self.auth.headers().await);

		let request = HttpRequest {
			method: method.clone(),
			url: url.to_string(),
			headers,
			body: body.cloned(),
		};

		debug!(attempt = attempt, timeout_ms = timeout.as_millis() as u64, "issuing request");
		let response = match tokio::time::timeout(timeout, self.transport.send(request)).await {
			Err(_) => return Err(ClassifiedError::timeout(timeout)),
			Ok(Err(e)) => return Err(ClassifiedError::from_transport(&e)),
			Ok(Ok(response)) => response,
		};

		if !response.status.is_success() {
			return Err(ClassifiedError::from_response(
				response.status,
				&response.body,
			));
		}

		debug!(attempt = attempt, status = response.status.as_u16(), "request succeeded");
		if response.is_json() {
			if response.body.trim().is_empty() {
				return Ok(ResponseBody::Json(Value::Null));
			}
			serde_json::from_str(&response.body)
				.map(ResponseBody::Json)
				.map_err(|e| ClassifiedError::unknown(format!("Malformed JSON response: {e}")))
		} else {
			Ok(ResponseBody::Text(response.body))
		}
	}
}

fn to_json<B: Serialize + ?Sized>(body: &B) -> Result<Value, ClassifiedError> {
	serde_json::to_value(body)
		.map_err(|e| ClassifiedError::unknown(format!("Failed to encode request body: {e}")))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ErrorKind;
	use crate::transport::{HttpResponse, TransportError};
	use reqwest::header::AUTHORIZATION;
	use reqwest::StatusCode;
	use serde_json::json;
	use std::collections::VecDeque;
	use std::sync::Mutex;

	enum Step {
		Respond(StatusCode, &'static str, Option<&'static str>),
		Fail(TransportError),
		Hang,
	}

	#[derive(Default)]
	struct ScriptedTransport {
		steps: Mutex<VecDeque<Step>>,
		seen: Mutex<Vec<HttpRequest>>,
	}

	impl std::fmt::Debug for ScriptedTransport {
		fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
			f.write_str("ScriptedTransport")
		}
	}

	impl ScriptedTransport {
		fn new(steps: Vec<Step>) -> Arc<Self> {
			Arc::new(Self {
				steps: Mutex::new(steps.into()),
				seen: Mutex::new(Vec::new()),
			})
		}

		fn calls(&self) -> usize {
			self.seen.lock().unwrap().len()
		}
	}

	#[async_trait]
	impl Transport for ScriptedTransport {
		async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
			self.seen.lock().unwrap().push(request);
			let step = self.steps.lock().unwrap().pop_front();
			match step {
				Some(Step::Respond(status, body, content_type)) => {
					let mut headers = HeaderMap::new();
					if let Some(ct) = content_type {
						headers.insert(CONTENT_TYPE, HeaderValue::from_static(ct));
					}
					Ok(HttpResponse {
						status,
						headers,
						body: body.to_string(),
					})
				}
				Some(Step::Fail(err)) => Err(err),
				Some(Step::Hang) | None => {
					std::future::pending::<()>().await;
					unreachable!()
				}
			}
		}
	}

	struct StaticToken(&'static str);

	#[async_trait]
	impl AuthHeaderSource for StaticToken {
		async fn headers(&self) -> HeaderMap {
			let mut headers = HeaderMap::new();
			headers.insert(
				AUTHORIZATION,
				HeaderValue::from_str(&format!("Bearer {}", self.0)).unwrap(),
			);
			headers
		}
	}

	const JSON: Option<&str> = Some("application/json");

	fn fast_profile(max_attempts: u32) -> RequestProfile {
		RequestProfile {
			timeout: Duration::from_millis(50),
			retry: RetryPolicy::new(max_attempts, Duration::from_millis(1)),
		}
	}

	fn client(transport: Arc<ScriptedTransport>, max_attempts: u32) -> ResilientHttpClient {
		ResilientHttpClient::builder()
			.base_url("http://api.test/api/")
			.transport(transport)
			.read_profile(fast_profile(max_attempts))
			.mutation_profile(fast_profile(max_attempts))
			.build()
			.unwrap()
	}

	#[tokio::test]
	async fn json_response_is_parsed() {
		let transport = ScriptedTransport::new(vec![Step::Respond(
			StatusCode::OK,
			r#"{"total":3}"#,
			Some("application/json; charset=utf-8"),
		)]);
		let client = client(transport.clone(), 3);

		let value: Value = client.get("/tasks/stats").await.unwrap();
		assert_eq!(value, json!({ "total": 3 }));
		let seen = transport.seen.lock().unwrap();
		assert_eq!(seen[0].url, "http://api.test/api/tasks/stats");
		assert_eq!(seen[0].method, Method::GET);
	}

	#[tokio::test]
	async fn non_json_response_is_returned_as_text() {
		let transport = ScriptedTransport::new(vec![Step::Respond(StatusCode::OK, "pong", None)]);
		let client = client(transport, 1);

		let body = client.send(Method::GET, "health", None).await.unwrap();
		assert_eq!(body, ResponseBody::Text("pong".to_string()));
	}

	#[tokio::test]
	async fn malformed_json_is_unknown_and_not_retried() {
		let transport =
			ScriptedTransport::new(vec![Step::Respond(StatusCode::OK, "{not json", JSON)]);
		let client = client(transport.clone(), 3);

		let err = client.get::<Value>("/tasks").await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Unknown);
		assert_eq!(transport.calls(), 1);
	}

	#[tokio::test]
	async fn not_found_is_attempted_once() {
		let transport = ScriptedTransport::new(vec![
			Step::Respond(StatusCode::NOT_FOUND, r#"{"message":"Task not found"}"#, JSON),
			Step::Respond(StatusCode::OK, "{}", JSON),
		]);
		let client = client(transport.clone(), 3);

		let err = client.get::<Value>("/tasks/missing").await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::ClientError);
		assert_eq!(err.message(), "Task not found");
		assert_eq!(transport.calls(), 1);
	}

	#[tokio::test]
	async fn server_errors_exhaust_attempts_and_surface_last_error() {
		let transport = ScriptedTransport::new(vec![
			Step::Respond(StatusCode::INTERNAL_SERVER_ERROR, r#"{"message":"first"}"#, JSON),
			Step::Respond(StatusCode::BAD_GATEWAY, r#"{"message":"second"}"#, JSON),
			Step::Respond(StatusCode::SERVICE_UNAVAILABLE, r#"{"message":"third"}"#, JSON),
		]);
		let client = client(transport.clone(), 3);

		let err = client.get::<Value>("/tasks").await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::ServerError);
		assert_eq!(err.status_code(), Some(503));
		assert_eq!(err.message(), "third");
		assert_eq!(transport.calls(), 3);
	}

	#[tokio::test]
	async fn network_failure_then_success() {
		let transport = ScriptedTransport::new(vec![
			Step::Fail(TransportError::Connect("refused".into())),
			Step::Respond(StatusCode::OK, r#"{"ok":true}"#, JSON),
		]);
		let client = client(transport.clone(), 3);

		let value: Value = client.get("/tasks").await.unwrap();
		assert_eq!(value["ok"], true);
		assert_eq!(transport.calls(), 2);
	}

	#[tokio::test]
	async fn hung_request_times_out_and_is_retried() {
		let transport = ScriptedTransport::new(vec![
			Step::Hang,
			Step::Respond(StatusCode::OK, "[]", JSON),
		]);
		let client = client(transport.clone(), 2);

		let value: Vec<Value> = client.get("/tasks").await.unwrap();
		assert!(value.is_empty());
		assert_eq!(transport.calls(), 2);
	}

	#[tokio::test]
	async fn timeout_surfaces_when_attempts_run_out() {
		let transport = ScriptedTransport::new(vec![Step::Hang]);
		let client = client(transport, 1);

		let err = client.get::<Value>("/tasks").await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Timeout);
	}

	#[tokio::test]
	async fn body_requests_carry_content_type_and_credentials() {
		let transport = ScriptedTransport::new(vec![Step::Respond(StatusCode::CREATED, "{}", JSON)]);
		let client = ResilientHttpClient::builder()
			.base_url("http://api.test/api")
			.transport(transport.clone())
			.auth(Arc::new(StaticToken("tok")))
			.build()
			.unwrap();

		let _: Value = client.post("/tasks", &json!({ "text": "write tests" })).await.unwrap();

		let seen = transport.seen.lock().unwrap();
		let request = &seen[0];
		assert_eq!(request.method, Method::POST);
		assert_eq!(request.headers[CONTENT_TYPE], "application/json");
		assert_eq!(request.headers[AUTHORIZATION], "Bearer tok");
		assert_eq!(request.body, Some(json!({ "text": "write tests" })));
	}

	#[tokio::test]
	async fn bodyless_requests_omit_content_type() {
		let transport = ScriptedTransport::new(vec![Step::Respond(StatusCode::OK, "{}", JSON)]);
		let client = client(transport.clone(), 1);

		let _: Value = client.post_empty("/tasks/1/timer/start").await.unwrap();
		let seen = transport.seen.lock().unwrap();
		assert!(seen[0].headers.get(CONTENT_TYPE).is_none());
		assert!(seen[0].headers.get(AUTHORIZATION).is_none());
	}

	#[test]
	fn profiles_follow_the_verb() {
		let transport = ScriptedTransport::new(vec![]);
		let client = ResilientHttpClient::builder()
			.base_url("http://api.test")
			.transport(transport)
			.build()
			.unwrap();

		assert_eq!(client.profile_for(&Method::GET).timeout, Duration::from_secs(10));
		assert_eq!(client.profile_for(&Method::DELETE).timeout, Duration::from_secs(10));
		assert_eq!(client.profile_for(&Method::POST).timeout, Duration::from_secs(15));
		assert_eq!(client.profile_for(&Method::PUT).timeout, Duration::from_secs(15));
	}

	#[test]
	fn base_url_is_validated() {
		assert!(matches!(
			ResilientHttpClient::builder().build(),
			Err(BuildError::MissingBaseUrl)
		));
		assert!(matches!(
			ResilientHttpClient::builder().base_url("localhost:5001").build(),
			Err(BuildError::InvalidBaseUrl(_))
		));
	}
}
