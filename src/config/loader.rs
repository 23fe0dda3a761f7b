// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{PlanFile, RawPlanFile};
use crate::errors::Result;

/// Load a plan file from a given path and return the raw `RawPlanFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawPlanFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let plan: RawPlanFile = toml::from_str(&contents)?;

    Ok(plan)
}

/// Load a plan file from path and validate it.
///
/// A relative `[plan].working_dir` is resolved against the directory that
/// contains the plan file.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<PlanFile> {
    let path = path.as_ref();
    let mut raw_plan = load_from_path(path)?;

    if let Some(dir) = raw_plan.plan.working_dir.take() {
        raw_plan.plan.working_dir = Some(resolve_against(path, dir));
    }

    PlanFile::try_from(raw_plan)
}

/// Default plan location: `Taskline.toml` in the current working directory.
pub fn default_plan_path() -> PathBuf {
    PathBuf::from("Taskline.toml")
}

fn resolve_against(plan_path: &Path, dir: PathBuf) -> PathBuf {
    if dir.is_absolute() {
        return dir;
    }
    match plan_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(dir),
        _ => dir,
    }
}
