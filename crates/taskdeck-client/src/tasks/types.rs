// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
	Low,
	#[default]
	Medium,
	High,
}

impl Priority {
	pub fn as_str(self) -> &'static str {
		match self {
			Priority::Low => "low",
			Priority::Medium => "medium",
			Priority::High => "high",
		}
	}
}

impl fmt::Display for Priority {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.pad(self.as_str())
	}
}

impl FromStr for Priority {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"low" => Ok(Priority::Low),
			"medium" => Ok(Priority::Medium),
			"high" => Ok(Priority::High),
			other => Err(format!("unknown priority: {other}")),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurringPattern {
	Daily,
	Weekly,
	Monthly,
}

/// Completion filter accepted by `GET /tasks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatusFilter {
	Completed,
	Pending,
}

impl TaskStatusFilter {
	pub fn as_str(self) -> &'static str {
		match self {
			TaskStatusFilter::Completed => "completed",
			TaskStatusFilter::Pending => "pending",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTask {
	#[serde(default)]
	pub id: String,
	pub text: String,
	#[serde(default)]
	pub completed: bool,
}

/// A task as returned by the server. Either `id` or `_id` may carry the
/// identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	id: Option<String>,
	#[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
	object_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	pub text: String,
	#[serde(default)]
	pub completed: bool,
	#[serde(default)]
	pub created_at: Option<DateTime<Utc>>,
	#[serde(default)]
	pub priority: Priority,
	#[serde(default)]
	pub category: String,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub due_date: Option<DateTime<Utc>>,
	/// Minutes.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub estimated_time: Option<u32>,
	/// Minutes.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub actual_time: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub time_started: Option<DateTime<Utc>>,
	#[serde(default)]
	pub is_recurring: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub recurring_pattern: Option<RecurringPattern>,
	#[serde(default)]
	pub subtasks: Vec<SubTask>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub notes: Option<String>,
}

impl Task {
	pub fn id(&self) -> Option<&str> {
		self.id.as_deref().or(self.object_id.as_deref())
	}

	pub fn is_timer_running(&self) -> bool {
		self.time_started.is_some()
	}

	pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
		!self.completed && self.due_date.is_some_and(|due| due < now)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
	pub total: u64,
	pub completed: u64,
	pub pending: u64,
	#[serde(default)]
	pub overdue: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub total_estimated_time: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub total_actual_time: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubTask {
	pub text: String,
	#[serde(skip_serializing_if = "std::ops::Not::not")]
	pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
	pub text: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub priority: Option<Priority>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub tags: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub due_date: Option<DateTime<Utc>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub estimated_time: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub is_recurring: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub recurring_pattern: Option<RecurringPattern>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub subtasks: Vec<NewSubTask>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub notes: Option<String>,
}

impl CreateTaskRequest {
	pub fn new(text: impl Into<String>) -> Self {
		Self {
			text: text.into(),
			..Self::default()
		}
	}
}

/// Partial update; only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub text: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub completed: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub priority: Option<Priority>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tags: Option<Vec<String>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub due_date: Option<DateTime<Utc>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub estimated_time: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub is_recurring: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub recurring_pattern: Option<RecurringPattern>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub notes: Option<String>,
}

impl UpdateTaskRequest {
	pub fn completed(completed: bool) -> Self {
		Self {
			completed: Some(completed),
			..Self::default()
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilters {
	pub search: Option<String>,
	pub priority: Option<Priority>,
	pub category: Option<String>,
	pub status: Option<TaskStatusFilter>,
	pub tags: Vec<String>,
}

impl TaskFilters {
	/// URL query string without the leading `?`; empty when nothing is set.
	pub fn to_query(&self) -> String {
		let mut query = url::form_urlencoded::Serializer::new(String::new());
		if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
			query.append_pair("search", search);
		}
		if let Some(priority) = self.priority {
			query.append_pair("priority", priority.as_str());
		}
		if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
			query.append_pair("category", category);
		}
		if let Some(status) = self.status {
			query.append_pair("status", status.as_str());
		}
		for tag in &self.tags {
			query.append_pair("tags", tag);
		}
		query.finish()
	}
}

/// Body of a task deletion response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Acknowledgement {
	#[serde(default)]
	pub success: bool,
	#[serde(default)]
	pub message: String,
}
