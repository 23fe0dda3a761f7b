// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TasklineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Two task specs in one run share a description. Descriptions are used
    /// as log tags and display labels, so they must be unique.
    #[error("Duplicate task description: {0}")]
    DuplicateTask(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TasklineError {
    /// `true` for errors caused by invalid caller input (plan file or task
    /// list), as opposed to IO failures.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            TasklineError::ConfigError(_)
                | TasklineError::DuplicateTask(_)
                | TasklineError::TomlError(_)
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TasklineError>;
