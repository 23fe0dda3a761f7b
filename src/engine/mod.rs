// src/engine/mod.rs

//! Task orchestration engine.
//!
//! This module ties together:
//! - the pure run state machine ([`core`]): status rows, result
//!   interpretation, the single-fire abort procedure and the final sweep
//! - the async shell ([`runtime`]) that launches background units, walks
//!   foreground tasks in order, forwards completion events into the core and
//!   fires cancellation when the core asks for it
//! - the [`RunResult`] handed back to the caller ([`result`])

use std::fmt;

use crate::task::{OperationResult, TaskHandle};

/// How a finished operation is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Returned `0` or no code.
    Success,
    /// Returned a non-zero code.
    Failed(i32),
    /// Raised an error (or panicked); recorded with exit code `1`.
    Errored(String),
}

impl TaskOutcome {
    /// Apply the result policy to an operation's return value.
    pub fn from_result(result: OperationResult) -> Self {
        match result {
            Ok(None) | Ok(Some(0)) => TaskOutcome::Success,
            Ok(Some(code)) => TaskOutcome::Failed(code),
            Err(err) => TaskOutcome::Errored(format!("{err:#}")),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success)
    }

    /// Exit code attached to the task row.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            TaskOutcome::Success => None,
            TaskOutcome::Failed(code) => Some(*code),
            TaskOutcome::Errored(_) => Some(1),
        }
    }
}

/// Why a run was aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortCause {
    /// The named task failed (non-zero code or raised error).
    TaskFailed { description: String },
    /// The runner's shutdown token was cancelled from outside.
    Interrupted,
}

impl fmt::Display for AbortCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortCause::TaskFailed { description } => write!(f, "task '{description}' failed"),
            AbortCause::Interrupted => f.write_str("interrupted"),
        }
    }
}

/// Events flowing into the core from the async shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// A task's operation is about to be awaited.
    TaskStarted { handle: TaskHandle },
    /// A task's operation returned (or raised).
    TaskCompleted {
        handle: TaskHandle,
        outcome: TaskOutcome,
    },
    /// A task's unit observed the abort cancellation before finishing.
    TaskCancelled { handle: TaskHandle },
    /// The run was interrupted from outside (e.g. Ctrl-C).
    Interrupted,
}

pub mod core;
pub mod result;
pub mod runtime;

pub use core::{CoreCommand, CoreStep, RunCore};
pub use result::RunResult;
pub use runtime::{run_tasks, TaskRunner};
