// src/engine/result.rs

use crate::engine::AbortCause;
use crate::task::{TaskHandle, TaskRow, TaskStatus};

/// Final summary of one run. Produced exactly once, when the run returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// `true` if the abort procedure ran.
    pub failed: bool,
    /// Final row of every task, in list order.
    pub tasks: Vec<TaskRow>,
    /// What triggered the abort, if anything did.
    pub cause: Option<AbortCause>,
}

impl RunResult {
    pub(crate) fn new(failed: bool, tasks: Vec<TaskRow>, cause: Option<AbortCause>) -> Self {
        Self {
            failed,
            tasks,
            cause,
        }
    }

    pub fn statuses(&self) -> Vec<TaskStatus> {
        self.tasks.iter().map(|row| row.status).collect()
    }

    pub fn row(&self, handle: TaskHandle) -> Option<&TaskRow> {
        self.tasks.get(handle.index())
    }

    pub fn status_of(&self, description: &str) -> Option<TaskStatus> {
        self.tasks
            .iter()
            .find(|row| row.description == description)
            .map(|row| row.status)
    }

    /// Failed tasks, not counting units stopped by the abort.
    pub fn failed_count(&self) -> usize {
        self.tasks.iter().filter(|row| row.is_genuine_failure()).count()
    }

    pub fn cancelled_count(&self) -> usize {
        self.tasks.iter().filter(|row| row.cancelled).count()
    }

    fn count(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|row| row.status == status).count()
    }

    /// Human-readable reason for a failed run, e.g.
    /// `"task 'test' failed (1 failed, 1 cancelled)"`.
    pub fn failure_reason(&self) -> Option<String> {
        if !self.failed {
            return None;
        }
        let cause = self
            .cause
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "aborted".to_string());
        Some(format!(
            "{cause} ({} failed, {} cancelled)",
            self.failed_count(),
            self.cancelled_count()
        ))
    }

    /// One-line tally, e.g. `"2 succeeded, 1 failed, 1 skipped"`.
    pub fn summary(&self) -> String {
        format!(
            "{} succeeded, {} failed, {} skipped",
            self.count(TaskStatus::Succeeded),
            self.count(TaskStatus::Failed),
            self.count(TaskStatus::Skipped)
        )
    }
}
