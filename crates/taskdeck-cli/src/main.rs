// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Taskdeck CLI
//!
//! Signs in against a Taskdeck server, keeps the session on disk between
//! invocations and manages the signed-in user's tasks.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use taskdeck_client::tasks::Priority;
use taskdeck_client::ClientContext;
use taskdeck_config::{
	load_config_with_cli,
	runtime::{LogFormat, LogLevel, LoggingConfig},
	CliOverrides,
};

mod auth;
mod tasks;

/// Taskdeck - tasks from the terminal
#[derive(Parser, Debug)]
#[command(name = "taskdeck", version, about, long_about = None)]
struct Args {
	/// Path to an extra configuration file
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// API base URL, including the `/api` prefix
	#[arg(long)]
	base_url: Option<String>,

	/// Where the session is persisted
	#[arg(long)]
	session_file: Option<PathBuf>,

	/// Log level (overrides config)
	#[arg(short, long)]
	log_level: Option<String>,

	/// Output logs as JSON (overrides config)
	#[arg(long)]
	json_logs: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Sign in with email and password
	Login {
		#[arg(long, short)]
		email: String,
		/// Prompted for when omitted
		#[arg(long, env = "TASKDECK_PASSWORD", hide_env_values = true)]
		password: Option<String>,
	},
	/// Create an account and sign in
	Register {
		#[arg(long, short)]
		username: String,
		#[arg(long, short)]
		email: String,
		#[arg(long, env = "TASKDECK_PASSWORD", hide_env_values = true)]
		password: Option<String>,
		#[arg(long)]
		first_name: Option<String>,
		#[arg(long)]
		last_name: Option<String>,
	},
	/// Sign out and forget the local session
	Logout,
	/// Show whether a session is active
	Status,
	/// View or edit the signed-in user's profile
	Profile {
		#[command(subcommand)]
		command: ProfileCommand,
	},
	/// Manage tasks
	Tasks {
		#[command(subcommand)]
		command: TasksCommand,
	},
	/// Print the resolved configuration
	Config,
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
	/// Fetch the profile from the server
	Show,
	/// Change profile fields
	Update {
		#[arg(long)]
		first_name: Option<String>,
		#[arg(long)]
		last_name: Option<String>,
		#[arg(long)]
		avatar: Option<String>,
	},
}

#[derive(Subcommand, Debug)]
enum TasksCommand {
	/// List tasks
	List {
		#[arg(long, short)]
		search: Option<String>,
		#[arg(long, short)]
		priority: Option<Priority>,
		#[arg(long)]
		category: Option<String>,
		/// Only completed tasks
		#[arg(long, conflicts_with = "pending")]
		completed: bool,
		/// Only pending tasks
		#[arg(long)]
		pending: bool,
		/// Repeatable
		#[arg(long = "tag", short)]
		tags: Vec<String>,
	},
	/// Show a single task
	Show { id: String },
	/// Create a task
	Add {
		text: String,
		#[arg(long, short)]
		priority: Option<Priority>,
		#[arg(long)]
		category: Option<String>,
		#[arg(long = "tag", short)]
		tags: Vec<String>,
		/// RFC 3339 timestamp, e.g. 2025-06-01T17:00:00Z
		#[arg(long)]
		due: Option<String>,
		/// Estimated minutes
		#[arg(long)]
		estimate: Option<u32>,
		#[arg(long)]
		notes: Option<String>,
	},
	/// Mark a task completed
	Done { id: String },
	/// Mark a task pending again
	Reopen { id: String },
	/// Delete a task
	Rm { id: String },
	/// Show task statistics
	Stats,
	/// Start the time tracker of a task
	Start { id: String },
	/// Stop the time tracker of a task
	Stop { id: String },
	/// Delete every task
	Clear {
		/// Required confirmation
		#[arg(long)]
		yes: bool,
	},
}

impl From<&Args> for CliOverrides {
	fn from(args: &Args) -> Self {
		Self {
			base_url: args.base_url.clone(),
			session_file: args.session_file.clone(),
			log_level: args.log_level.clone(),
			log_format: if args.json_logs {
				Some("json".to_string())
			} else {
				None
			},
			config_file: args.config.clone(),
		}
	}
}

fn log_level_to_tracing(level: LogLevel) -> tracing::Level {
	match level {
		LogLevel::Trace => tracing::Level::TRACE,
		LogLevel::Debug => tracing::Level::DEBUG,
		LogLevel::Info => tracing::Level::INFO,
		LogLevel::Warn => tracing::Level::WARN,
		LogLevel::Error => tracing::Level::ERROR,
	}
}

/// Logs go to stderr; stdout carries command output.
fn init_tracing(logging: &LoggingConfig) {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(format!("taskdeck={}", log_level_to_tracing(logging.level))));

	match logging.format {
		LogFormat::Json => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().json().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Compact => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().compact().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Pretty => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().with_writer(std::io::stderr))
				.init();
		}
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	let config =
		load_config_with_cli(CliOverrides::from(&args)).context("failed to load configuration")?;
	init_tracing(&config.logging);

	debug!(
		base_url = %config.api.base_url,
		session_file = %config.session.file.display(),
		"starting taskdeck"
	);

	if let Command::Config = args.command {
		println!(
			"{}",
			serde_json::to_string_pretty(&config).context("failed to render configuration")?
		);
		return Ok(());
	}

	let context = ClientContext::from_config(&config).context("failed to set up the API client")?;

	match args.command {
		Command::Login { email, password } => auth::login(&context, email, password).await,
		Command::Register {
			username,
			email,
			password,
			first_name,
			last_name,
		} => {
			auth::register(
				&context,
				auth::Registration {
					username,
					email,
					password,
					first_name,
					last_name,
				},
			)
			.await
		}
		Command::Logout => auth::logout(&context).await,
		Command::Status => auth::status(&context).await,
		Command::Profile { command } => match command {
			ProfileCommand::Show => auth::show_profile(&context).await,
			ProfileCommand::Update {
				first_name,
				last_name,
				avatar,
			} => auth::update_profile(&context, first_name, last_name, avatar).await,
		},
		Command::Tasks { command } => tasks::run(&context, command).await,
		Command::Config => Ok(()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cli_definition_is_consistent() {
		use clap::CommandFactory;
		Args::command().debug_assert();
	}

	#[test]
	fn json_logs_flag_maps_to_format_override() {
		let args = Args::parse_from(["taskdeck", "--json-logs", "-l", "debug", "status"]);
		let overrides = CliOverrides::from(&args);
		assert_eq!(overrides.log_format.as_deref(), Some("json"));
		assert_eq!(overrides.log_level.as_deref(), Some("debug"));
		assert!(overrides.base_url.is_none());
	}

	#[test]
	fn task_filters_parse_priority_and_tags() {
		let args = Args::parse_from([
			"taskdeck", "tasks", "list", "--priority", "HIGH", "--tag", "home", "--tag", "errands",
			"--pending",
		]);
		match args.command {
			Command::Tasks {
				command: TasksCommand::List {
					priority,
					tags,
					pending,
					completed,
					..
				},
			} => {
				assert_eq!(priority, Some(Priority::High));
				assert_eq!(tags, vec!["home", "errands"]);
				assert!(pending);
				assert!(!completed);
			}
			other => panic!("unexpected command: {other:?}"),
		}
	}

	#[test]
	fn completed_and_pending_conflict() {
		assert!(Args::try_parse_from(["taskdeck", "tasks", "list", "--completed", "--pending"]).is_err());
	}

	#[test]
	fn log_levels_map_to_tracing_levels() {
		assert_eq!(log_level_to_tracing(LogLevel::Warn), tracing::Level::WARN);
		assert_eq!(log_level_to_tracing(LogLevel::Trace), tracing::Level::TRACE);
	}
}
