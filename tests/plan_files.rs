// tests/plan_files.rs

mod common;
use crate::common::{init_tracing, memory_sink, with_timeout, TestResult};

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use taskline::config::{load_and_validate, load_from_path, PlanFile};
use taskline::errors::TasklineError;
use taskline_test_utils::builders::{PlanFileBuilder, TaskEntryBuilder};
use tempfile::TempDir;

fn write_plan(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("Taskline.toml");
    fs::write(&path, contents).expect("write plan");
    path
}

#[test]
fn bundled_plans_are_valid() -> TestResult {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("plans");

    let bind = load_and_validate(root.join("bind-instance.toml"))?;
    assert_eq!(bind.plan.title.as_deref(), Some("Bind and start instance"));
    assert_eq!(bind.tasks.len(), 4);
    assert!(bind.tasks[1].background);
    assert_eq!(bind.tasks[2].deadline()?, Some(Duration::from_secs(10)));

    let release = load_and_validate(root.join("release.toml"))?;
    assert_eq!(release.plan.working_dir, Some(root.join(".")));
    assert_eq!(release.to_task_specs()?.len(), 3);
    Ok(())
}

#[test]
fn specs_follow_plan_order_and_flags() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_plan(
        &dir,
        r#"
[[task]]
description = "tail"
cmd = "tail -f log"
background = true

[[task]]
description = "bind"
cmd = "echo bind"
timeout = "500ms"
"#,
    );

    let specs = load_and_validate(&path)?.to_task_specs()?;
    assert_eq!(specs.len(), 2);
    assert_eq!(specs[0].description(), "tail");
    assert!(specs[0].is_background());
    assert_eq!(specs[0].deadline(), None);
    assert!(!specs[1].is_background());
    assert_eq!(specs[1].deadline(), Some(Duration::from_millis(500)));
    Ok(())
}

#[test]
fn relative_working_dir_resolves_against_plan_location() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_plan(
        &dir,
        r#"
[plan]
working_dir = "app"

[[task]]
description = "ls"
cmd = "ls"
"#,
    );

    let plan = load_and_validate(&path)?;
    assert_eq!(plan.plan.working_dir, Some(dir.path().join("app")));
    Ok(())
}

#[test]
fn empty_plan_is_valid() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_plan(&dir, "");
    let plan = load_and_validate(&path)?;
    assert!(plan.tasks.is_empty());
    Ok(())
}

#[test]
fn duplicate_descriptions_are_rejected() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_plan(
        &dir,
        r#"
[[task]]
description = "build"
cmd = "make"

[[task]]
description = "build"
cmd = "make again"
"#,
    );

    let err = load_and_validate(&path).unwrap_err();
    assert!(err.is_configuration_error());
    assert!(err.to_string().contains("build"), "{err}");
    Ok(())
}

#[test]
fn malformed_toml_is_a_toml_error() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_plan(&dir, "[[task]\ndescription = ");
    assert!(matches!(
        load_from_path(&path),
        Err(TasklineError::TomlError(_))
    ));
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() {
    let err = load_and_validate("/definitely/not/here/Taskline.toml").unwrap_err();
    assert!(matches!(err, TasklineError::IoError(_)));
    assert!(!err.is_configuration_error());
}

#[test]
fn builder_rejects_bad_timeout() {
    let raw = PlanFileBuilder::new()
        .with_task(TaskEntryBuilder::new("slow", "sleep 1").timeout("soon").build())
        .build_raw();
    let err = PlanFile::try_from(raw).unwrap_err();
    assert!(matches!(err, TasklineError::ConfigError(ref msg) if msg.contains("slow")));
}

#[cfg(unix)]
#[tokio::test]
async fn plan_commands_run_end_to_end() -> TestResult {
    init_tracing();
    let plan = PlanFileBuilder::new()
        .title("e2e")
        .env("GREETING", "hello")
        .with_task(
            TaskEntryBuilder::new("greet", "echo $GREETING $WHO")
                .env("WHO", "world")
                .build(),
        )
        .with_task(
            TaskEntryBuilder::new("ticker", "echo tick; sleep 0.1; echo tock")
                .background(true)
                .build(),
        )
        .with_task(TaskEntryBuilder::new("fail", "exit 7").build())
        .with_task(TaskEntryBuilder::new("never", "echo unreachable").build())
        .build();

    let sink = memory_sink();
    let result = with_timeout(taskline::run_tasks(plan.to_task_specs()?, sink.clone())).await?;

    assert!(result.failed);
    assert_eq!(result.status_of("greet"), Some(taskline::TaskStatus::Succeeded));
    assert_eq!(result.tasks[2].exit_code, Some(7));
    assert_eq!(result.status_of("never"), Some(taskline::TaskStatus::Skipped));
    assert!(sink.messages_for("greet").contains(&"hello world".to_string()));
    assert!(sink.messages_for("fail").contains(&"Exited with code 7".to_string()));
    assert_eq!(sink.count_containing("unreachable"), 0);
    Ok(())
}
