// src/config/mod.rs

//! Task plan loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed plan model (`model.rs`).
//! - Load a plan file from disk (`loader.rs`).
//! - Validate plan invariants before anything runs (`validate.rs`).
//! - Parse the short duration strings used for `timeout` (`duration.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::{parse_duration, DurationError};
pub use loader::{default_plan_path, load_and_validate, load_from_path};
pub use model::{PlanFile, PlanSection, RawPlanFile, TaskEntry};
