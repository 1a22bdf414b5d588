// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Task endpoints over the resilient client.

mod types;

use std::sync::Arc;

use taskdeck_common_http::{ClassifiedError, ResilientHttpClient};
use tracing::instrument;

pub use types::{
	Acknowledgement, CreateTaskRequest, NewSubTask, Priority, RecurringPattern, SubTask, Task,
	TaskFilters, TaskStats, TaskStatusFilter, UpdateTaskRequest,
};

/// CRUD, statistics and timers for the signed-in user's tasks.
///
/// Failures surface as [`ClassifiedError`] after the client's retry policy
/// has run.
#[derive(Debug, Clone)]
pub struct TaskService {
	http: Arc<ResilientHttpClient>,
}

impl TaskService {
	pub fn new(http: Arc<ResilientHttpClient>) -> Self {
		Self { http }
	}

	#[instrument(skip_all)]
	pub async fn list(&self, filters: &TaskFilters) -> Result<Vec<Task>, ClassifiedError> {
		let query = filters.to_query();
		if query.is_empty() {
			self.http.get("/tasks").await
		} else {
			self.http.get(&format!("/tasks?{query}")).await
		}
	}

	#[instrument(skip(self))]
	pub async fn get(&self, id: &str) -> Result<Task, ClassifiedError> {
		self.http.get(&task_path(id)).await
	}

	#[instrument(skip_all)]
	pub async fn create(&self, request: &CreateTaskRequest) -> Result<Task, ClassifiedError> {
		self.http.post("/tasks", request).await
	}

	#[instrument(skip(self, request))]
	pub async fn update(&self, id: &str, request: &UpdateTaskRequest) -> Result<Task, ClassifiedError> {
		self.http.put(&task_path(id), request).await
	}

	#[instrument(skip(self))]
	pub async fn delete(&self, id: &str) -> Result<Acknowledgement, ClassifiedError> {
		self.http.delete(&task_path(id)).await
	}

	pub async fn stats(&self) -> Result<TaskStats, ClassifiedError> {
		self.http.get("/tasks/stats").await
	}

	#[instrument(skip(self))]
	pub async fn start_timer(&self, id: &str) -> Result<Task, ClassifiedError> {
		self.http.post_empty(&format!("{}/timer/start", task_path(id))).await
	}

	#[instrument(skip(self))]
	pub async fn stop_timer(&self, id: &str) -> Result<Task, ClassifiedError> {
		self.http.post_empty(&format!("{}/timer/stop", task_path(id))).await
	}

	/// Deletes every task of the current user.
	#[instrument(skip_all)]
	pub async fn clear_all(&self) -> Result<Acknowledgement, ClassifiedError> {
		self.http.delete("/tasks").await
	}
}

fn task_path(id: &str) -> String {
	// Form encoding writes spaces as `+`, which a path would keep literally.
	let encoded = url::form_urlencoded::byte_serialize(id.as_bytes())
		.collect::<String>()
		.replace('+', "%20");
	format!("/tasks/{encoded}")
}
