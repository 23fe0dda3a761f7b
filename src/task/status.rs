// src/task/status.rs

use std::fmt;

use thiserror::Error;

/// Lifecycle of a single task within one run.
///
/// `Pending` is the only initial state. `Succeeded`, `Failed` and `Skipped`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Skipped
        )
    }

    /// Whether `self -> next` is one of the legal transitions:
    ///
    /// - `Pending -> Running` (task starts)
    /// - `Pending -> Skipped` (abort happened before the task started)
    /// - `Running -> Succeeded` (exit code 0 or none)
    /// - `Running -> Failed` (non-zero code, raised error, or in flight at abort)
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Running)
                | (TaskStatus::Pending, TaskStatus::Skipped)
                | (TaskStatus::Running, TaskStatus::Succeeded)
                | (TaskStatus::Running, TaskStatus::Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
            TaskStatus::Skipped => "skipped",
        }
    }

    /// Icon used when rendering a task row.
    pub fn icon(self) -> &'static str {
        match self {
            TaskStatus::Pending => "●",
            TaskStatus::Running => "⏳",
            TaskStatus::Succeeded => "✅",
            TaskStatus::Failed => "❌",
            TaskStatus::Skipped => "⤴",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a caller asks for a transition outside the table above.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("illegal task status transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: TaskStatus,
    pub to: TaskStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [TaskStatus; 5] = [
        TaskStatus::Pending,
        TaskStatus::Running,
        TaskStatus::Succeeded,
        TaskStatus::Failed,
        TaskStatus::Skipped,
    ];

    #[test]
    fn rows_start_pending() {
        assert_eq!(TaskStatus::default(), TaskStatus::Pending);
        assert!(!TaskStatus::default().is_terminal());
    }

    #[test]
    fn only_table_transitions_are_legal() {
        let legal = [
            (TaskStatus::Pending, TaskStatus::Running),
            (TaskStatus::Pending, TaskStatus::Skipped),
            (TaskStatus::Running, TaskStatus::Succeeded),
            (TaskStatus::Running, TaskStatus::Failed),
        ];

        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    legal.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn terminal_states_never_move() {
        for from in ALL.into_iter().filter(|s| s.is_terminal()) {
            assert!(ALL.iter().all(|to| !from.can_transition_to(*to)));
        }
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
    }
}
