// src/engine/runtime.rs

//! Async shell around [`RunCore`].
//!
//! The shell owns everything that needs Tokio:
//! - a [`JoinSet`] of background units, launched before the first
//!   foreground task is awaited
//! - an mpsc channel carrying background completions back to the core
//! - the run's abort [`CancellationToken`], fired when the core returns
//!   [`CoreCommand::CancelInFlight`]
//! - the caller's shutdown token (external interruption)
//! - a `watch` channel publishing the rows after every transition
//!
//! Only the shell's own flow calls into the core, so the rows are never
//! shared between tasks.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::result::RunResult;
use crate::engine::{RunEvent, TaskOutcome};
use crate::errors::{Result, TasklineError};
use crate::sink::LogSink;
use crate::task::{OperationFuture, TaskContext, TaskHandle, TaskRow, TaskSpec};

use super::core::{CoreCommand, CoreStep, RunCore};

/// Run `tasks` to completion, writing progress to `sink`.
///
/// Fails only if the task list itself is invalid; every per-task error is
/// folded into the returned [`RunResult`].
pub async fn run_tasks(tasks: Vec<TaskSpec>, sink: Arc<dyn LogSink>) -> Result<RunResult> {
    Ok(TaskRunner::new(tasks, sink)?.run().await)
}

/// Orchestrates one ordered list of tasks.
pub struct TaskRunner {
    specs: Vec<TaskSpec>,
    sink: Arc<dyn LogSink>,
    shutdown: CancellationToken,
    rows_tx: watch::Sender<Vec<TaskRow>>,
}

impl fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRunner")
            .field("specs", &self.specs)
            .finish_non_exhaustive()
    }
}

impl TaskRunner {
    /// Validate `specs` and prepare a run. Nothing executes until
    /// [`TaskRunner::run`].
    pub fn new(specs: Vec<TaskSpec>, sink: Arc<dyn LogSink>) -> Result<Self> {
        validate_specs(&specs)?;

        let rows = specs
            .iter()
            .map(|spec| TaskRow::new(spec.description(), spec.is_background()))
            .collect();
        let (rows_tx, _) = watch::channel(rows);

        Ok(Self {
            specs,
            sink,
            shutdown: CancellationToken::new(),
            rows_tx,
        })
    }

    /// Cancelling this token interrupts the run: it is treated like a task
    /// failure and triggers the abort procedure.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Live view of the task rows, updated after every transition.
    pub fn subscribe(&self) -> watch::Receiver<Vec<TaskRow>> {
        self.rows_tx.subscribe()
    }

    /// Handle of the task with the given description.
    pub fn handle_of(&self, description: &str) -> Option<TaskHandle> {
        self.specs
            .iter()
            .position(|spec| spec.description() == description)
            .map(TaskHandle::new)
    }

    /// Execute the run.
    ///
    /// 1. Launch every background task.
    /// 2. Await foreground tasks one by one in list order, stopping at the
    ///    first failure.
    /// 3. Wait for every background unit to finish or acknowledge
    ///    cancellation.
    /// 4. Sweep, close, and report.
    pub async fn run(self) -> RunResult {
        let TaskRunner {
            specs,
            sink,
            shutdown,
            rows_tx,
        } = self;

        let mut shell = Shell {
            core: RunCore::new(&specs, sink.clone()),
            abort: CancellationToken::new(),
            rows_tx,
        };
        shell.core.begin();

        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<RunEvent>();
        let mut units = JoinSet::new();

        for (index, spec) in specs.iter().enumerate().filter(|(_, s)| s.is_background()) {
            let handle = TaskHandle::new(index);
            shell.apply(RunEvent::TaskStarted { handle });

            let fut = spec.invoke(shell.context_for(spec, &sink));
            let abort = shell.abort.clone();
            let tx = event_tx.clone();
            units.spawn(async move {
                let event = guarded(handle, fut, abort).await;
                // The receiver outlives every unit; a send error means the
                // run itself was dropped.
                let _ = tx.send(event);
            });
        }
        // Only the units hold senders now, so the channel closes once they
        // have all reported.
        drop(event_tx);

        for (index, spec) in specs.iter().enumerate().filter(|(_, s)| !s.is_background()) {
            if shell.core.is_aborted() {
                break;
            }

            let handle = TaskHandle::new(index);
            shell.apply(RunEvent::TaskStarted { handle });

            let fut = guarded(handle, spec.invoke(shell.context_for(spec, &sink)), shell.abort.clone());
            tokio::pin!(fut);

            // Keep draining background events while the foreground task runs,
            // so a background failure aborts it promptly.
            let event = loop {
                tokio::select! {
                    event = &mut fut => break event,
                    Some(event) = event_rx.recv() => shell.apply(event),
                    _ = shutdown.cancelled(), if !shell.core.is_aborted() => {
                        shell.apply(RunEvent::Interrupted);
                    }
                }
            };
            // Events already queued were reported before this outcome.
            while let Ok(queued) = event_rx.try_recv() {
                shell.apply(queued);
            }
            shell.apply(event);
        }

        debug!("foreground tasks done; waiting for background units");
        loop {
            tokio::select! {
                event = event_rx.recv() => match event {
                    Some(event) => shell.apply(event),
                    None => break,
                },
                _ = shutdown.cancelled(), if !shell.core.is_aborted() => {
                    shell.apply(RunEvent::Interrupted);
                }
            }
        }

        while let Some(joined) = units.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "background unit did not complete cleanly");
            }
        }

        let result = shell.core.finish();
        shell.rows_tx.send_replace(result.tasks.clone());
        info!(
            failed = result.failed,
            summary = %result.summary(),
            "run result ready"
        );
        result
    }
}

/// Mutable state of one run, owned by the shell's own flow.
struct Shell {
    core: RunCore,
    abort: CancellationToken,
    rows_tx: watch::Sender<Vec<TaskRow>>,
}

impl Shell {
    fn apply(&mut self, event: RunEvent) {
        let CoreStep { commands } = self.core.step(event);
        for command in commands {
            match command {
                CoreCommand::CancelInFlight => {
                    debug!("cancelling in-flight units");
                    self.abort.cancel();
                }
            }
        }
        self.rows_tx.send_replace(self.core.rows().to_vec());
    }

    fn context_for(&self, spec: &TaskSpec, sink: &Arc<dyn LogSink>) -> TaskContext {
        TaskContext::new(spec.description(), self.abort.child_token(), sink.clone())
    }
}

/// Drive one operation until it finishes or the run aborts.
///
/// Cancellation is observed at the operation's next suspension point: the
/// future is dropped there. Panics are caught and reported like raised
/// errors.
async fn guarded(handle: TaskHandle, op: OperationFuture, abort: CancellationToken) -> RunEvent {
    let op = AssertUnwindSafe(op).catch_unwind();
    tokio::select! {
        biased;
        _ = abort.cancelled() => RunEvent::TaskCancelled { handle },
        result = op => {
            let outcome = match result {
                Ok(result) => TaskOutcome::from_result(result),
                Err(panic) => TaskOutcome::Errored(panic_message(panic.as_ref())),
            };
            RunEvent::TaskCompleted { handle, outcome }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        "panicked".to_string()
    }
}

fn validate_specs(specs: &[TaskSpec]) -> Result<()> {
    let mut seen = HashSet::new();
    for spec in specs {
        if !seen.insert(spec.description()) {
            return Err(TasklineError::DuplicateTask(spec.description().to_string()));
        }
    }
    Ok(())
}
