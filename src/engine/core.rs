// src/engine/core.rs

//! Pure run state machine.
//!
//! [`RunCore`] is synchronous and deterministic: it consumes [`RunEvent`]s,
//! updates the task rows, writes one sink line per transition and returns a
//! [`CoreStep`] telling the async shell what to do next. It has no channels
//! and spawns nothing, so every abort/sweep rule can be unit tested directly.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::engine::result::RunResult;
use crate::engine::{AbortCause, RunEvent, TaskOutcome};
use crate::sink::LogSink;
use crate::task::{TaskHandle, TaskRow, TaskSpec, TaskStatus};

pub const START_MESSAGE: &str = "Starting tasks";
pub const ABORT_MESSAGE: &str = "Aborting remaining tasks due to failure";
pub const INTERRUPTED_MESSAGE: &str = "Interrupted";
pub const SUCCESS_MESSAGE: &str = "All tasks complete.";
pub const FAILURE_MESSAGE: &str = "Tasks aborted due to failure.";

/// Command produced by the core, executed by the async shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreCommand {
    /// Fire the run's cancellation token so every unit still in flight
    /// stops at its next suspension point.
    CancelInFlight,
}

/// Result of handling a single [`RunEvent`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
}

impl CoreStep {
    fn none() -> Self {
        Self::default()
    }
}

/// Per-run bookkeeping: one row per task, plus the abort state.
pub struct RunCore {
    rows: Vec<TaskRow>,
    sink: Arc<dyn LogSink>,
    abort: Option<AbortCause>,
}

impl RunCore {
    pub fn new(specs: &[TaskSpec], sink: Arc<dyn LogSink>) -> Self {
        let rows = specs
            .iter()
            .map(|spec| TaskRow::new(spec.description(), spec.is_background()))
            .collect();
        Self {
            rows,
            sink,
            abort: None,
        }
    }

    pub fn rows(&self) -> &[TaskRow] {
        &self.rows
    }

    pub fn row(&self, handle: TaskHandle) -> Option<&TaskRow> {
        self.rows.get(handle.index())
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.is_some()
    }

    /// Write the run's opening line.
    pub fn begin(&self) {
        info!(tasks = self.rows.len(), "task run starting");
        self.sink.write(None, START_MESSAGE);
    }

    /// Handle a single event, returning the commands for the shell.
    pub fn step(&mut self, event: RunEvent) -> CoreStep {
        match event {
            RunEvent::TaskStarted { handle } => {
                self.handle_started(handle);
                CoreStep::none()
            }
            RunEvent::TaskCompleted { handle, outcome } => self.handle_completed(handle, outcome),
            RunEvent::TaskCancelled { handle } => self.handle_cancelled(handle),
            RunEvent::Interrupted => {
                if self.is_aborted() {
                    return CoreStep::none();
                }
                warn!("task run interrupted");
                self.sink.write(None, INTERRUPTED_MESSAGE);
                self.abort(AbortCause::Interrupted)
            }
        }
    }

    fn handle_started(&mut self, handle: TaskHandle) {
        let row = &mut self.rows[handle.index()];
        if let Err(err) = row.transition(TaskStatus::Running, None) {
            warn!(task = %row.description, error = %err, "ignoring start event");
            return;
        }

        if row.background {
            self.sink
                .write(Some(&row.description), "Scheduling background task");
        }
        debug!(task = %row.description, background = row.background, "task started");
        self.sink.write(Some(&row.description), "Starting");
    }

    fn handle_completed(&mut self, handle: TaskHandle, outcome: TaskOutcome) -> CoreStep {
        let row = &mut self.rows[handle.index()];

        match &outcome {
            TaskOutcome::Success => self.sink.write(Some(&row.description), "Finished"),
            TaskOutcome::Failed(code) => self.sink.write(
                Some(&row.description),
                &format!("Finished with exit code {code}"),
            ),
            TaskOutcome::Errored(detail) => self
                .sink
                .write(Some(&row.description), &format!("Error: {detail}")),
        }

        if row.status != TaskStatus::Running {
            // Forced to Failed by an abort while the result was in transit.
            debug!(
                task = %row.description,
                status = %row.status,
                ?outcome,
                "outcome arrived after task reached a terminal state; keeping it"
            );
            return CoreStep::none();
        }

        let next = if outcome.is_success() {
            TaskStatus::Succeeded
        } else {
            TaskStatus::Failed
        };
        if let Err(err) = row.transition(next, outcome.exit_code()) {
            warn!(task = %row.description, error = %err, "ignoring completion event");
            return CoreStep::none();
        }

        info!(
            task = %row.description,
            status = %row.status,
            exit_code = ?row.exit_code,
            "task finished"
        );

        if next == TaskStatus::Failed {
            let description = row.description.clone();
            return self.abort(AbortCause::TaskFailed { description });
        }
        CoreStep::none()
    }

    fn handle_cancelled(&mut self, handle: TaskHandle) -> CoreStep {
        let row = &mut self.rows[handle.index()];
        self.sink.write(Some(&row.description), "Cancelled");

        if row.status == TaskStatus::Running && row.transition(TaskStatus::Failed, Some(1)).is_ok() {
            // Only reachable if a unit stops on its own token without an abort.
            row.cancelled = true;
        }
        debug!(task = %row.description, status = %row.status, "task cancellation acknowledged");
        CoreStep::none()
    }

    /// The abort procedure. Executes at most once per run.
    ///
    /// Rows still `Pending` are left for [`RunCore::finish`] to sweep.
    fn abort(&mut self, cause: AbortCause) -> CoreStep {
        if let Some(existing) = &self.abort {
            debug!(%existing, ignored = %cause, "abort already triggered");
            return CoreStep::none();
        }

        warn!(%cause, "aborting task run");
        self.sink.write(None, ABORT_MESSAGE);
        self.abort = Some(cause);

        for row in self.rows.iter_mut() {
            if row.status == TaskStatus::Running && row.transition(TaskStatus::Failed, Some(1)).is_ok() {
                row.cancelled = true;
                debug!(task = %row.description, "in-flight task forced to Failed");
                self.sink
                    .write(Some(&row.description), "Marked failed: still running at abort");
            }
        }

        CoreStep {
            commands: vec![CoreCommand::CancelInFlight],
        }
    }

    /// Close the run: sweep `Pending` rows to `Skipped` after an abort, write
    /// the closing line and build the [`RunResult`].
    pub fn finish(mut self) -> RunResult {
        for row in self.rows.iter_mut() {
            if row.status == TaskStatus::Running {
                // Every unit is joined before `finish`, so this means its
                // completion event was lost.
                warn!(task = %row.description, "task still running at end of run; marking failed");
                if row.transition(TaskStatus::Failed, Some(1)).is_ok() {
                    self.sink
                        .write(Some(&row.description), "Error: no result reported");
                    if self.abort.is_none() {
                        self.abort = Some(AbortCause::TaskFailed {
                            description: row.description.clone(),
                        });
                    }
                }
            }
        }

        if self.abort.is_some() {
            for row in self.rows.iter_mut() {
                if row.status == TaskStatus::Pending && row.transition(TaskStatus::Skipped, None).is_ok() {
                    self.sink.write(Some(&row.description), "Skipped");
                }
            }
        }

        let failed = self.abort.is_some();
        self.sink
            .write(None, if failed { FAILURE_MESSAGE } else { SUCCESS_MESSAGE });
        info!(failed, cause = ?self.abort, "task run finished");

        RunResult::new(failed, self.rows, self.abort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use crate::task::TaskContext;

    fn spec(desc: &str, background: bool) -> TaskSpec {
        let op = |_ctx: TaskContext| async { Ok::<_, anyhow::Error>(None) };
        if background {
            TaskSpec::background(desc, op)
        } else {
            TaskSpec::foreground(desc, op)
        }
    }

    fn core_with(specs: &[TaskSpec]) -> (RunCore, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (RunCore::new(specs, sink.clone()), sink)
    }

    fn h(i: usize) -> TaskHandle {
        TaskHandle::new(i)
    }

    #[test]
    fn success_path_marks_everything_succeeded() {
        let (mut core, sink) = core_with(&[spec("build", false), spec("test", false)]);
        core.begin();
        for i in 0..2 {
            core.step(RunEvent::TaskStarted { handle: h(i) });
            let step = core.step(RunEvent::TaskCompleted {
                handle: h(i),
                outcome: TaskOutcome::Success,
            });
            assert!(step.commands.is_empty());
        }

        let result = core.finish();
        assert!(!result.failed);
        assert_eq!(result.statuses(), vec![TaskStatus::Succeeded; 2]);
        assert_eq!(sink.run_messages(), vec![START_MESSAGE, SUCCESS_MESSAGE]);
        assert_eq!(sink.messages_for("build"), vec!["Starting", "Finished"]);
    }

    #[test]
    fn failure_aborts_and_sweeps_pending_to_skipped() {
        let (mut core, sink) = core_with(&[
            spec("build", false),
            spec("test", false),
            spec("deploy", false),
        ]);
        core.begin();
        core.step(RunEvent::TaskStarted { handle: h(0) });
        core.step(RunEvent::TaskCompleted {
            handle: h(0),
            outcome: TaskOutcome::Success,
        });
        core.step(RunEvent::TaskStarted { handle: h(1) });
        let step = core.step(RunEvent::TaskCompleted {
            handle: h(1),
            outcome: TaskOutcome::Failed(1),
        });
        assert_eq!(step.commands, vec![CoreCommand::CancelInFlight]);
        assert!(core.is_aborted());

        // Pending rows are only swept at the end.
        assert_eq!(core.row(h(2)).map(|r| r.status), Some(TaskStatus::Pending));

        let result = core.finish();
        assert!(result.failed);
        assert_eq!(
            result.statuses(),
            vec![TaskStatus::Succeeded, TaskStatus::Failed, TaskStatus::Skipped]
        );
        assert_eq!(result.tasks[1].exit_code, Some(1));
        assert_eq!(
            result.cause,
            Some(AbortCause::TaskFailed {
                description: "test".to_string()
            })
        );
        assert_eq!(sink.messages_for("deploy"), vec!["Skipped"]);
        assert_eq!(
            sink.run_messages(),
            vec![START_MESSAGE, ABORT_MESSAGE, FAILURE_MESSAGE]
        );
    }

    #[test]
    fn abort_is_single_fire() {
        let (mut core, sink) = core_with(&[spec("a", true), spec("b", true)]);
        core.step(RunEvent::TaskStarted { handle: h(0) });
        core.step(RunEvent::TaskStarted { handle: h(1) });

        let first = core.step(RunEvent::TaskCompleted {
            handle: h(0),
            outcome: TaskOutcome::Failed(2),
        });
        let second = core.step(RunEvent::TaskCompleted {
            handle: h(1),
            outcome: TaskOutcome::Errored("boom".into()),
        });
        let third = core.step(RunEvent::Interrupted);

        assert_eq!(first.commands, vec![CoreCommand::CancelInFlight]);
        assert!(second.commands.is_empty());
        assert!(third.commands.is_empty());
        assert_eq!(sink.count_containing(ABORT_MESSAGE), 1);

        let result = core.finish();
        assert_eq!(result.tasks[0].exit_code, Some(2));
        // `b` was forced to Failed(1) by the abort; its late error is logged but
        // does not change the row.
        assert_eq!(result.tasks[1].status, TaskStatus::Failed);
        assert_eq!(result.tasks[1].exit_code, Some(1));
        assert!(result.tasks[1].cancelled);
        assert_eq!(result.failed_count(), 1);
        assert_eq!(sink.messages_for("b").last().unwrap(), "Error: boom");
    }

    #[test]
    fn abort_forces_in_flight_rows_failed_and_keeps_terminal_rows() {
        let (mut core, sink) = core_with(&[
            spec("done", true),
            spec("watch", true),
            spec("setup", false),
        ]);
        for i in 0..3 {
            core.step(RunEvent::TaskStarted { handle: h(i) });
        }
        core.step(RunEvent::TaskCompleted {
            handle: h(0),
            outcome: TaskOutcome::Success,
        });
        core.step(RunEvent::TaskCompleted {
            handle: h(2),
            outcome: TaskOutcome::Errored("no such instance".into()),
        });

        assert_eq!(core.row(h(0)).map(|r| r.status), Some(TaskStatus::Succeeded));
        let watch = core.row(h(1)).unwrap();
        assert_eq!(watch.status, TaskStatus::Failed);
        assert_eq!(watch.exit_code, Some(1));
        assert!(core.row(h(9)).is_none());
        assert!(sink
            .messages_for("watch")
            .contains(&"Marked failed: still running at abort".to_string()));

        core.step(RunEvent::TaskCancelled { handle: h(1) });
        // Cancelling a unit that already succeeded changes nothing.
        core.step(RunEvent::TaskCancelled { handle: h(0) });

        let result = core.finish();
        assert_eq!(result.tasks[0].status, TaskStatus::Succeeded);
        assert!(!result.tasks[0].cancelled);
        assert!(result.tasks[1].cancelled);
        assert_eq!(result.failed_count(), 1);
        assert_eq!(result.cancelled_count(), 1);
    }

    #[test]
    fn interrupt_aborts_with_distinct_cause() {
        let (mut core, sink) = core_with(&[spec("setup", false), spec("after", false)]);
        core.step(RunEvent::TaskStarted { handle: h(0) });
        let step = core.step(RunEvent::Interrupted);
        assert_eq!(step.commands, vec![CoreCommand::CancelInFlight]);
        core.step(RunEvent::TaskCancelled { handle: h(0) });

        let result = core.finish();
        assert!(result.failed);
        assert_eq!(result.cause, Some(AbortCause::Interrupted));
        assert_eq!(
            result.statuses(),
            vec![TaskStatus::Failed, TaskStatus::Skipped]
        );
        assert_eq!(result.failed_count(), 0);
        assert_eq!(sink.count_containing(INTERRUPTED_MESSAGE), 1);
    }

    #[test]
    fn unreported_running_row_fails_the_run() {
        let (mut core, sink) = core_with(&[spec("lost", true), spec("next", false)]);
        core.step(RunEvent::TaskStarted { handle: h(0) });

        let result = core.finish();
        assert!(result.failed);
        assert_eq!(result.tasks[0].status, TaskStatus::Failed);
        assert_eq!(result.tasks[0].exit_code, Some(1));
        assert_eq!(result.tasks[1].status, TaskStatus::Skipped);
        assert_eq!(
            result.cause,
            Some(AbortCause::TaskFailed {
                description: "lost".to_string()
            })
        );
        assert_eq!(
            sink.messages_for("lost"),
            vec!["Scheduling background task", "Starting", "Error: no result reported"]
        );
    }

    #[test]
    fn empty_run_only_logs_markers() {
        let (core, sink) = core_with(&[]);
        core.begin();
        let result = core.finish();

        assert!(!result.failed);
        assert!(result.tasks.is_empty());
        assert_eq!(sink.run_messages(), vec![START_MESSAGE, SUCCESS_MESSAGE]);
        assert_eq!(sink.lines().len(), 2);
    }
}
