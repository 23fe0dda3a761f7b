#![allow(dead_code)]

use std::collections::BTreeMap;

use taskline::config::{PlanFile, PlanSection, RawPlanFile, TaskEntry};

/// Builder for `PlanFile` to simplify test setup.
pub struct PlanFileBuilder {
    plan: RawPlanFile,
}

impl PlanFileBuilder {
    pub fn new() -> Self {
        Self {
            plan: RawPlanFile {
                plan: PlanSection::default(),
                tasks: Vec::new(),
            },
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.plan.plan.title = Some(title.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.plan.plan.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_task(mut self, task: TaskEntry) -> Self {
        self.plan.tasks.push(task);
        self
    }

    pub fn build_raw(self) -> RawPlanFile {
        self.plan
    }

    pub fn build(self) -> PlanFile {
        PlanFile::try_from(self.plan).expect("Failed to build valid plan from builder")
    }
}

impl Default for PlanFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskEntry`.
pub struct TaskEntryBuilder {
    task: TaskEntry,
}

impl TaskEntryBuilder {
    pub fn new(description: &str, cmd: &str) -> Self {
        Self {
            task: TaskEntry {
                description: description.to_string(),
                cmd: cmd.to_string(),
                background: false,
                timeout: None,
                env: BTreeMap::new(),
            },
        }
    }

    pub fn background(mut self, val: bool) -> Self {
        self.task.background = val;
        self
    }

    pub fn timeout(mut self, duration: &str) -> Self {
        self.task.timeout = Some(duration.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.task.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> TaskEntry {
        self.task
    }
}
