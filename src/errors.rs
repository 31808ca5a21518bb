// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GanttError {
    /// An edit would leave a task ending at or before its start.
    #[error("Invalid schedule for task {task}: end {end} is not after start {start}")]
    InvalidSchedule {
        task: String,
        start: String,
        end: String,
    },

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Link not found: {0}")]
    LinkNotFound(String),

    #[error("Duplicate task id: {0}")]
    DuplicateTask(String),

    #[error("Task {0} cannot depend on itself")]
    SelfDependency(String),

    /// A link references a task that does not exist.
    #[error("Link {link} references missing task {task}")]
    DanglingLink { link: String, task: String },

    /// A link would make propagation revisit a task it already scheduled.
    #[error("Cyclic dependency through link {link} into task {task}")]
    CyclicDependency { link: String, task: String },

    #[error("Failed to persist schedule for group {group}: {reason}")]
    StorePersistFailure { group: String, reason: String },

    #[error("Timestamp arithmetic out of range for task {0}")]
    TimeOverflow(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, GanttError>;
