// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};

use taskdeck_client::tasks::{
	CreateTaskRequest, Task, TaskFilters, TaskStats, TaskStatusFilter, UpdateTaskRequest,
};
use taskdeck_client::ClientContext;

use crate::TasksCommand;

pub async fn run(context: &ClientContext, command: TasksCommand) -> Result<()> {
	if !context.session.is_authenticated().await {
		bail!("not signed in; run `taskdeck login` first");
	}
	let tasks = &context.tasks;

	match command {
		TasksCommand::List {
			search,
			priority,
			category,
			completed,
			pending,
			tags,
		} => {
			let status = match (completed, pending) {
				(true, _) => Some(TaskStatusFilter::Completed),
				(_, true) => Some(TaskStatusFilter::Pending),
				_ => None,
			};
			let filters = TaskFilters {
				search,
				priority,
				category,
				status,
				tags,
			};
			let list = tasks.list(&filters).await.context("failed to list tasks")?;
			print_tasks(&list, Utc::now());
		}
		TasksCommand::Show { id } => {
			let task = tasks.get(&id).await.context("failed to load task")?;
			println!(
				"{}",
				serde_json::to_string_pretty(&task).context("failed to render task")?
			);
		}
		TasksCommand::Add {
			text,
			priority,
			category,
			tags,
			due,
			estimate,
			notes,
		} => {
			let due_date = due.as_deref().map(parse_due).transpose()?;
			let request = CreateTaskRequest {
				priority,
				category,
				tags,
				due_date,
				estimated_time: estimate,
				notes,
				..CreateTaskRequest::new(text)
			};
			let task = tasks.create(&request).await.context("failed to create task")?;
			println!("Created {}", task.id().unwrap_or("task"));
		}
		TasksCommand::Done { id } => {
			tasks
				.update(&id, &UpdateTaskRequest::completed(true))
				.await
				.context("failed to update task")?;
			println!("Completed {id}");
		}
		TasksCommand::Reopen { id } => {
			tasks
				.update(&id, &UpdateTaskRequest::completed(false))
				.await
				.context("failed to update task")?;
			println!("Reopened {id}");
		}
		TasksCommand::Rm { id } => {
			let ack = tasks.delete(&id).await.context("failed to delete task")?;
			println!("{}", or_default(&ack.message, "Task deleted"));
		}
		TasksCommand::Stats => {
			let stats = tasks.stats().await.context("failed to load statistics")?;
			print_stats(&stats);
		}
		TasksCommand::Start { id } => {
			tasks.start_timer(&id).await.context("failed to start timer")?;
			println!("Timer started for {id}");
		}
		TasksCommand::Stop { id } => {
			let task = tasks.stop_timer(&id).await.context("failed to stop timer")?;
			match task.actual_time {
				Some(minutes) => println!("Timer stopped for {id} ({minutes} min tracked)"),
				None => println!("Timer stopped for {id}"),
			}
		}
		TasksCommand::Clear { yes } => {
			if !yes {
				bail!("refusing to delete every task without --yes");
			}
			let ack = tasks.clear_all().await.context("failed to clear tasks")?;
			println!("{}", or_default(&ack.message, "All tasks deleted"));
		}
	}
	Ok(())
}

fn parse_due(value: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(value)
		.map(|due| due.with_timezone(&Utc))
		.with_context(|| format!("invalid due date '{value}', expected RFC 3339"))
}

fn or_default<'a>(message: &'a str, fallback: &'a str) -> &'a str {
	if message.is_empty() {
		fallback
	} else {
		message
	}
}

fn truncate(text: &str, width: usize) -> String {
	if text.chars().count() > width {
		let head: String = text.chars().take(width.saturating_sub(3)).collect();
		format!("{head}...")
	} else {
		text.to_string()
	}
}

fn status_mark(task: &Task, now: DateTime<Utc>) -> &'static str {
	if task.completed {
		"done"
	} else if task.is_timer_running() {
		"timing"
	} else if task.is_overdue(now) {
		"overdue"
	} else {
		""
	}
}

fn print_tasks(tasks: &[Task], now: DateTime<Utc>) {
	if tasks.is_empty() {
		println!("No tasks");
		return;
	}

	println!("{:<26} {:<8} {:<8} {:<40}", "ID", "PRIORITY", "STATUS", "TEXT");
	println!("{}", "-".repeat(84));
	for task in tasks {
		println!(
			"{:<26} {:<8} {:<8} {:<40}",
			task.id().unwrap_or("-"),
			task.priority,
			status_mark(task, now),
			truncate(&task.text, 40)
		);
	}
}

fn print_stats(stats: &TaskStats) {
	println!("Total:     {}", stats.total);
	println!("Completed: {}", stats.completed);
	println!("Pending:   {}", stats.pending);
	println!("Overdue:   {}", stats.overdue);
	if let Some(minutes) = stats.total_actual_time {
		println!("Tracked:   {minutes} min");
	}
}
