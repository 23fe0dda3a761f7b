//! Canned task operations for runner tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use taskline::task::{OperationFuture, TaskContext, TaskSpec};
use tokio::sync::Notify;

/// Operation type produced by the helpers in this module.
pub type TestOp = Arc<dyn Fn(TaskContext) -> OperationFuture + Send + Sync>;

/// Returns `code` immediately (`None` = no explicit code).
pub fn returns(code: Option<i32>) -> TestOp {
    Arc::new(move |_ctx: TaskContext| -> OperationFuture {
        Box::pin(async move { Ok::<_, anyhow::Error>(code) })
    })
}

pub fn succeeds() -> TestOp {
    returns(Some(0))
}

pub fn exits(code: i32) -> TestOp {
    returns(Some(code))
}

/// Raises an error with the given message.
pub fn raises(message: &'static str) -> TestOp {
    Arc::new(move |_ctx: TaskContext| -> OperationFuture {
        Box::pin(async move { Err::<Option<i32>, _>(anyhow!(message)) })
    })
}

/// Sleeps, then returns `code`.
pub fn after(delay: Duration, code: Option<i32>) -> TestOp {
    Arc::new(move |_ctx: TaskContext| -> OperationFuture {
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            Ok::<_, anyhow::Error>(code)
        })
    })
}

/// Never finishes on its own; only an abort stops it.
pub fn until_cancelled() -> TestOp {
    Arc::new(|ctx: TaskContext| -> OperationFuture {
        Box::pin(async move {
            ctx.cancellation().cancelled().await;
            Ok::<_, anyhow::Error>(None)
        })
    })
}

/// Waits for `gate` to be notified, then returns `code`.
pub fn waits_for(gate: Arc<Notify>, code: Option<i32>) -> TestOp {
    Arc::new(move |_ctx: TaskContext| -> OperationFuture {
        let gate = gate.clone();
        Box::pin(async move {
            gate.notified().await;
            Ok::<_, anyhow::Error>(code)
        })
    })
}

/// Notifies `gate` (waking one waiter, or the next one to arrive), then
/// returns `code`.
pub fn notifies(gate: Arc<Notify>, code: Option<i32>) -> TestOp {
    Arc::new(move |_ctx: TaskContext| -> OperationFuture {
        let gate = gate.clone();
        Box::pin(async move {
            gate.notify_one();
            Ok::<_, anyhow::Error>(code)
        })
    })
}

/// Records the order in which operations start.
#[derive(Debug, Clone, Default)]
pub struct StartLog {
    started: Arc<Mutex<Vec<String>>>,
}

impl StartLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    /// Wrap `op` so its description is recorded when it starts.
    pub fn track(&self, op: TestOp) -> TestOp {
        let started = self.started.clone();
        Arc::new(move |ctx: TaskContext| -> OperationFuture {
            started.lock().unwrap().push(ctx.description().to_string());
            op(ctx)
        })
    }
}

pub fn fg(description: &str, op: TestOp) -> TaskSpec {
    TaskSpec::foreground(description, move |ctx| op(ctx))
}

pub fn bg(description: &str, op: TestOp) -> TaskSpec {
    TaskSpec::background(description, move |ctx| op(ctx))
}
