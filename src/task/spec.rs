// src/task/spec.rs

//! Immutable task descriptions.
//!
//! A [`TaskSpec`] pairs a unique description with an opaque asynchronous
//! operation. The runner never looks inside the operation; it only
//! interprets what it returns:
//!
//! - `Ok(None)` / `Ok(Some(0))` means success,
//! - `Ok(Some(code))` means failure with `code`,
//! - `Err(_)` means failure with code `1`.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::sink::LogSink;

/// What an operation produces: an optional exit code, or an error.
pub type OperationResult = anyhow::Result<Option<i32>>;

/// Boxed future returned by an [`Operation`].
pub type OperationFuture = BoxFuture<'static, OperationResult>;

/// Shared, type-erased operation. Called once per run with a fresh context.
pub type Operation = Arc<dyn Fn(TaskContext) -> OperationFuture + Send + Sync>;

/// Context handed to an operation when its task starts.
///
/// Anything else an operation needs (instance names, ports, ...) should be
/// captured by the closure when the spec is built.
#[derive(Clone)]
pub struct TaskContext {
    description: String,
    cancel: CancellationToken,
    sink: Arc<dyn LogSink>,
}

impl TaskContext {
    pub fn new(
        description: impl Into<String>,
        cancel: CancellationToken,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            description: description.into(),
            cancel,
            sink,
        }
    }

    /// The task's own description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Token that fires when the run aborts. Long-running operations should
    /// select on [`CancellationToken::cancelled`] at their suspension points.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Write a line tagged with this task's description.
    pub fn log(&self, message: impl AsRef<str>) {
        self.sink.write(Some(&self.description), message.as_ref());
    }

    pub fn sink(&self) -> &Arc<dyn LogSink> {
        &self.sink
    }
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("description", &self.description)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Immutable description of one unit of work.
#[derive(Clone)]
pub struct TaskSpec {
    description: String,
    operation: Operation,
    background: bool,
    deadline: Option<Duration>,
}

impl TaskSpec {
    /// A task that runs in list order and blocks later foreground tasks.
    pub fn foreground<F, Fut>(description: impl Into<String>, op: F) -> Self
    where
        F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = OperationResult> + Send + 'static,
    {
        Self::new(description, false, op)
    }

    /// A task launched at the start of the run that runs concurrently with
    /// everything else.
    pub fn background<F, Fut>(description: impl Into<String>, op: F) -> Self
    where
        F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = OperationResult> + Send + 'static,
    {
        Self::new(description, true, op)
    }

    fn new<F, Fut>(description: impl Into<String>, background: bool, op: F) -> Self
    where
        F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = OperationResult> + Send + 'static,
    {
        let operation: Operation =
            Arc::new(move |ctx: TaskContext| -> OperationFuture { Box::pin(op(ctx)) });
        Self {
            description: description.into(),
            operation,
            background,
            deadline: None,
        }
    }

    /// Fail the task with a raised error if its operation has not finished
    /// within `deadline`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_background(&self) -> bool {
        self.background
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Build the operation's future for one execution.
    pub(crate) fn invoke(&self, ctx: TaskContext) -> OperationFuture {
        let fut = (self.operation)(ctx);
        match self.deadline {
            None => fut,
            Some(deadline) => Box::pin(async move {
                match tokio::time::timeout(deadline, fut).await {
                    Ok(result) => result,
                    Err(_) => Err(anyhow!("deadline of {deadline:?} exceeded")),
                }
            }),
        }
    }
}

impl fmt::Debug for TaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSpec")
            .field("description", &self.description)
            .field("background", &self.background)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
