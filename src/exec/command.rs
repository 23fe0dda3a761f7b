// src/exec/command.rs

//! Shell-command operations.
//!
//! [`command_operation`] turns a [`CommandSpec`] into an operation for a
//! [`TaskSpec`](crate::task::TaskSpec). The child's stdout and stderr are
//! streamed line by line to the task's log tag, and its exit code becomes the
//! task's result. If the run aborts, the child is killed.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::task::{OperationFuture, TaskContext};

/// A shell command plus the environment it runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub cmd: String,
    pub working_dir: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

impl CommandSpec {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            working_dir: None,
            env: BTreeMap::new(),
        }
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Build a shell command appropriate for the platform.
    fn to_command(&self) -> Command {
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd.envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

/// Operation that runs `spec` and reports its exit code.
pub fn command_operation(
    spec: CommandSpec,
) -> impl Fn(TaskContext) -> OperationFuture + Send + Sync + 'static {
    move |ctx: TaskContext| -> OperationFuture {
        let spec = spec.clone();
        Box::pin(async move { run_command(&spec, &ctx).await.map(Some) })
    }
}

/// Run the command to completion, streaming output to `ctx`.
///
/// Returns the exit code (`-1` if the process was killed by a signal).
pub async fn run_command(spec: &CommandSpec, ctx: &TaskContext) -> Result<i32> {
    ctx.log(format!("Running: {}", spec.cmd));
    info!(task = %ctx.description(), cmd = %spec.cmd, "starting task process");

    let mut child = spec
        .to_command()
        .spawn()
        .with_context(|| format!("spawning process for task '{}'", ctx.description()))?;

    let stdout = child.stdout.take().map(|out| spawn_line_forwarder(out, ctx.clone()));
    let stderr = child.stderr.take().map(|err| spawn_line_forwarder(err, ctx.clone()));

    let status = tokio::select! {
        status = child.wait() => status.with_context(|| {
            format!("waiting for process of task '{}'", ctx.description())
        })?,
        _ = ctx.cancellation().cancelled() => {
            info!(task = %ctx.description(), "cancellation requested; killing process");
            if let Err(e) = child.kill().await {
                warn!(task = %ctx.description(), error = %e, "failed to kill child process");
            }
            anyhow::bail!("process for task '{}' was cancelled", ctx.description());
        }
    };

    // Drain the remaining output so "Exited" is the task's last line.
    for forwarder in [stdout, stderr].into_iter().flatten() {
        if let Err(e) = forwarder.await {
            debug!(task = %ctx.description(), error = %e, "output forwarder ended abnormally");
        }
    }

    let code = status.code().unwrap_or(-1);
    info!(
        task = %ctx.description(),
        exit_code = code,
        success = status.success(),
        "task process exited"
    );
    ctx.log(format!("Exited with code {code}"));
    Ok(code)
}

fn spawn_line_forwarder<R>(reader: R, ctx: TaskContext) -> tokio::task::JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => ctx.log(line),
                Ok(None) => break,
                Err(e) => {
                    debug!(task = %ctx.description(), error = %e, "stopped reading process output");
                    break;
                }
            }
        }
    })
}
