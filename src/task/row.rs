// src/task/row.rs

//! Per-task bookkeeping rows.
//!
//! The runner holds one [`TaskRow`] per [`TaskSpec`](super::TaskSpec), in list
//! order, and addresses them through [`TaskHandle`]s rather than looking them
//! up by description.

use std::fmt;

use super::status::{InvalidTransition, TaskStatus};

/// Typed positional handle to a task row within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(usize);

impl TaskHandle {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mutable state of one task within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub description: String,
    pub background: bool,
    pub status: TaskStatus,
    /// Exit code attached at the terminal transition, if any.
    pub exit_code: Option<i32>,
    /// The row was forced to `Failed` by an abort while still running. It is
    /// an effect of the abort rather than its cause.
    pub cancelled: bool,
}

impl TaskRow {
    pub fn new(description: impl Into<String>, background: bool) -> Self {
        Self {
            description: description.into(),
            background,
            status: TaskStatus::Pending,
            exit_code: None,
            cancelled: false,
        }
    }

    /// Move to `next`, attaching `exit_code`.
    ///
    /// Illegal transitions leave the row untouched.
    pub fn transition(
        &mut self,
        next: TaskStatus,
        exit_code: Option<i32>,
    ) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.exit_code = exit_code;
        Ok(())
    }

    /// `Failed` for a reason other than cancellation by an abort.
    pub fn is_genuine_failure(&self) -> bool {
        self.status == TaskStatus::Failed && !self.cancelled
    }

    /// Display text, e.g. `"✅ build"` or `"❌ test (exit 3)"`.
    pub fn label(&self) -> String {
        let icon = self.status.icon();
        match (self.status, self.exit_code) {
            (TaskStatus::Failed, Some(code)) if code != 0 => {
                format!("{icon} {} (exit {code})", self.description)
            }
            _ => format!("{icon} {}", self.description),
        }
    }
}
