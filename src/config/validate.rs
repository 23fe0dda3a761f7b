// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{PlanFile, RawPlanFile};
use crate::errors::{Result, TasklineError};

impl TryFrom<RawPlanFile> for PlanFile {
    type Error = crate::errors::TasklineError;

    fn try_from(raw: RawPlanFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_plan(&raw)?;
        Ok(PlanFile::new_unchecked(raw.plan, raw.tasks))
    }
}

fn validate_raw_plan(plan: &RawPlanFile) -> Result<()> {
    validate_task_fields(plan)?;
    validate_unique_descriptions(plan)?;
    validate_timeouts(plan)?;
    Ok(())
}

fn validate_task_fields(plan: &RawPlanFile) -> Result<()> {
    for (index, task) in plan.tasks.iter().enumerate() {
        if task.description.trim().is_empty() {
            return Err(TasklineError::ConfigError(format!(
                "task #{} has an empty `description`",
                index + 1
            )));
        }
        if task.cmd.trim().is_empty() {
            return Err(TasklineError::ConfigError(format!(
                "task '{}' has an empty `cmd`",
                task.description
            )));
        }
    }
    Ok(())
}

fn validate_unique_descriptions(plan: &RawPlanFile) -> Result<()> {
    let mut seen = HashSet::new();
    for task in plan.tasks.iter() {
        if !seen.insert(task.description.as_str()) {
            return Err(TasklineError::ConfigError(format!(
                "duplicate task description '{}'",
                task.description
            )));
        }
    }
    Ok(())
}

fn validate_timeouts(plan: &RawPlanFile) -> Result<()> {
    for task in plan.tasks.iter() {
        task.deadline()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::TaskEntry;

    fn entry(description: &str, cmd: &str) -> TaskEntry {
        TaskEntry {
            description: description.to_string(),
            cmd: cmd.to_string(),
            background: false,
            timeout: None,
            env: Default::default(),
        }
    }

    fn raw(tasks: Vec<TaskEntry>) -> RawPlanFile {
        RawPlanFile {
            tasks,
            ..Default::default()
        }
    }

    #[test]
    fn empty_plan_is_valid() {
        let plan = PlanFile::try_from(RawPlanFile::default()).unwrap();
        assert!(plan.tasks.is_empty());
    }

    #[test]
    fn duplicate_descriptions_are_rejected() {
        let err = PlanFile::try_from(raw(vec![entry("a", "true"), entry("a", "false")]))
            .unwrap_err();
        match err {
            TasklineError::ConfigError(msg) => assert!(msg.contains("duplicate"), "{msg}"),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert!(PlanFile::try_from(raw(vec![entry("  ", "true")])).is_err());
        assert!(PlanFile::try_from(raw(vec![entry("a", "")])).is_err());
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let mut task = entry("slow", "sleep 1");
        task.timeout = Some("soon".to_string());

        let err = PlanFile::try_from(raw(vec![task])).unwrap_err();
        assert!(err.to_string().contains("invalid timeout"), "{err}");
    }
}
