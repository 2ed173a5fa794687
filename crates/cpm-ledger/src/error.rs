//! # Ledger Errors

use std::path::PathBuf;

use thiserror::Error;

use cpm_core::{DrawId, DrawNumber, ProjectId, TaskId};
use cpm_state::{DrawError, TaskError};

/// Errors raised by ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// A project configuration value is out of range.
    #[error("invalid project configuration: {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// The configuration file could not be read or written.
    #[error("project configuration {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML/JSON for a project.
    #[error("project configuration {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// A task lifecycle transition was rejected.
    #[error(transparent)]
    Task(#[from] TaskError),

    /// A draw lifecycle transition was rejected.
    #[error(transparent)]
    Draw(#[from] DrawError),

    /// A parent task still has subtasks awaiting approval.
    #[error("task {parent} has {open} subtask(s) not yet approved")]
    OpenSubtasks { parent: TaskId, open: usize },

    /// The referenced parent task cannot take new subtasks.
    #[error("task {parent} cannot take subtasks: {reason}")]
    InvalidParent { parent: TaskId, reason: String },

    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    #[error("draw {0} not found")]
    DrawNotFound(DrawId),

    /// Disbursed draws are part of the audit trail.
    #[error("draw {0} has been disbursed and cannot be deleted")]
    DrawNotDeletable(DrawNumber),

    /// A record belongs to a different project.
    #[error("record belongs to {found}, expected {expected}")]
    ProjectMismatch {
        expected: ProjectId,
        found: ProjectId,
    },

    #[error("draw numbers exhausted for this project")]
    DrawNumbersExhausted,
}

impl LedgerError {
    /// Whether the error is a rejected state change rather than a missing
    /// record or bad input.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::Task(TaskError::InvalidTransition { .. } | TaskError::TerminalState { .. })
                | Self::Draw(
                    DrawError::InvalidTransition { .. }
                        | DrawError::TerminalState { .. }
                        | DrawError::NotEligible { .. }
                )
                | Self::OpenSubtasks { .. }
                | Self::DrawNotDeletable(_)
                | Self::DrawNumbersExhausted
        )
    }
}
