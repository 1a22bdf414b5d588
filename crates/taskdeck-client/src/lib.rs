// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session and task services for Taskdeck.
//!
//! [`SessionService`] turns the authentication endpoints into a single
//! [`SessionResult`] type with a closed set of [`FailureReason`]s and keeps
//! the [`taskdeck_session_store::SessionStore`] in step with the server.
//! [`TaskService`] exposes the task endpoints. [`ClientContext`] wires both
//! to one store and one resilient HTTP client.

mod context;
mod outcome;
mod session;
pub mod tasks;
mod types;

pub use context::{ClientContext, KEYRING_SERVICE};
pub use outcome::{FailureReason, SessionFailure, SessionResponse, SessionResult};
pub use session::{SessionService, SessionStatus};
pub use tasks::TaskService;
pub use types::{AuthPayload, Envelope, LoginRequest, ProfileUpdateRequest, RegisterRequest};
