// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod sink;
pub mod task;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::config::model::PlanFile;
use crate::engine::{RunResult, TaskRunner};
use crate::sink::ConsoleSink;

pub use crate::engine::run_tasks;
pub use crate::sink::LogSink;
pub use crate::task::{TaskContext, TaskSpec, TaskStatus};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - plan loading and validation
/// - the task runner, logging to stdout
/// - Ctrl-C handling (interrupts the run)
///
/// Returns `true` if every task succeeded.
pub async fn run(args: CliArgs) -> Result<bool> {
    let plan_path = args.plan;
    let plan = load_and_validate(&plan_path)
        .with_context(|| format!("failed to load plan {}", plan_path.display()))?;

    if args.dry_run {
        print_dry_run(&plan);
        return Ok(true);
    }

    if let Some(title) = &plan.plan.title {
        println!("{title}");
    }

    let specs = plan.to_task_specs()?;
    let runner = TaskRunner::new(specs, Arc::new(ConsoleSink::stdout()))?;

    // Ctrl-C → abort the run.
    {
        let shutdown = runner.shutdown_token();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            shutdown.cancel();
        });
    }

    info!(plan = %plan_path.display(), tasks = plan.tasks.len(), "running plan");
    let result = runner.run().await;
    print_summary(&result);

    Ok(!result.failed)
}

/// Print the final task rows and tally.
fn print_summary(result: &RunResult) {
    println!();
    for row in &result.tasks {
        println!("  {}", row.label());
    }
    println!();
    match result.failure_reason() {
        Some(reason) => println!("{} ({reason})", result.summary()),
        None => println!("{}", result.summary()),
    }
}

/// Simple dry-run output: print tasks and their commands.
fn print_dry_run(plan: &PlanFile) {
    println!("taskline dry-run");
    if let Some(title) = &plan.plan.title {
        println!("  plan.title = {title}");
    }
    if let Some(dir) = &plan.plan.working_dir {
        println!("  plan.working_dir = {}", dir.display());
    }
    if !plan.plan.env.is_empty() {
        println!("  plan.env = {:?}", plan.plan.env);
    }
    println!();

    println!("tasks ({}):", plan.tasks.len());
    for task in plan.tasks.iter() {
        let kind = if task.background { "background" } else { "foreground" };
        println!("  - {} [{kind}]", task.description);
        println!("      cmd: {}", task.cmd);
        if let Some(ref timeout) = task.timeout {
            println!("      timeout: {timeout}");
        }
        if !task.env.is_empty() {
            println!("      env: {:?}", task.env);
        }
    }

    debug!("dry-run complete (no execution)");
}
