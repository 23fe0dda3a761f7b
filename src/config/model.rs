// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::config::duration::parse_duration;
use crate::errors::{Result, TasklineError};
use crate::exec::{command_operation, CommandSpec};
use crate::task::TaskSpec;

/// Top-level plan as read from a TOML file, before validation.
///
/// ```toml
/// [plan]
/// title = "Bind and start instance"
/// env = { TD_INSTANCE = "dev" }
///
/// [[task]]
/// description = "Stop running instance"
/// cmd = "tdserver stop"
///
/// [[task]]
/// description = "Tail server log"
/// cmd = "tail -f server.log"
/// background = true
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPlanFile {
    #[serde(default)]
    pub plan: PlanSection,

    /// Tasks in execution order, from `[[task]]` entries.
    #[serde(default, rename = "task")]
    pub tasks: Vec<TaskEntry>,
}

/// `[plan]` section. Everything is optional.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PlanSection {
    /// Heading printed before the run.
    #[serde(default)]
    pub title: Option<String>,

    /// Directory every command runs in. Relative paths are resolved against
    /// the plan file's directory by the loader.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Environment variables applied to every command.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// One `[[task]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskEntry {
    /// Unique label; used as the log tag and display text.
    pub description: String,

    /// Shell command to execute.
    pub cmd: String,

    /// Launch immediately and run alongside the foreground tasks.
    #[serde(default)]
    pub background: bool,

    /// Optional deadline such as `"30s"`; exceeding it fails the task.
    #[serde(default)]
    pub timeout: Option<String>,

    /// Task-local environment; overrides `[plan].env` on conflicts.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl TaskEntry {
    /// Parsed `timeout`, if any.
    pub fn deadline(&self) -> Result<Option<Duration>> {
        self.timeout
            .as_deref()
            .map(|raw| {
                parse_duration(raw).map_err(|e| {
                    TasklineError::ConfigError(format!(
                        "task '{}' has invalid timeout '{}': {}",
                        self.description, raw, e
                    ))
                })
            })
            .transpose()
    }
}

/// A validated plan. Build one with `PlanFile::try_from(raw)` or
/// [`load_and_validate`](crate::config::load_and_validate).
#[derive(Debug, Clone)]
pub struct PlanFile {
    pub plan: PlanSection,
    pub tasks: Vec<TaskEntry>,
}

impl PlanFile {
    pub(crate) fn new_unchecked(plan: PlanSection, tasks: Vec<TaskEntry>) -> Self {
        Self { plan, tasks }
    }

    /// Build subprocess-backed task specs, in plan order.
    pub fn to_task_specs(&self) -> Result<Vec<TaskSpec>> {
        self.tasks
            .iter()
            .map(|entry| {
                let mut command = CommandSpec::new(entry.cmd.clone());
                command.working_dir = self.plan.working_dir.clone();
                command.env = self.plan.env.clone();
                command.env.extend(entry.env.clone());

                let op = command_operation(command);
                let spec = if entry.background {
                    TaskSpec::background(entry.description.clone(), op)
                } else {
                    TaskSpec::foreground(entry.description.clone(), op)
                };

                Ok(match entry.deadline()? {
                    Some(deadline) => spec.with_deadline(deadline),
                    None => spec,
                })
            })
            .collect()
    }
}
