//! Typed error hierarchy for Waypoint.
//!
//! Three top-level enums cover the three collaborators:
//! - `ToolError`: invoking the external assistant CLI
//! - `PlanError`: resolving plan files and phase/step selectors
//! - `ReviewError`: orchestration-level failures

use std::path::PathBuf;
use thiserror::Error;

/// Errors from invoking the external assistant.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Failed to spawn assistant process '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while talking to the assistant: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write log file at {path}: {source}")]
    LogWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the plan/file collaborator and selector resolution.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Plan path does not exist: {0}")]
    PlanNotFound(PathBuf),

    #[error("No phase files (*.md) found in plan {0}")]
    NoPhases(PathBuf),

    #[error("Phase '{selector}' not found in plan")]
    PhaseNotFound { selector: String },

    #[error("Unknown step '{0}'. Valid steps: research, planning, review")]
    UnknownStep(String),

    #[error("A phase must be selected when the plan has {count} phases (or pass --all)")]
    PhaseSelectorRequired { count: usize },

    #[error("Failed to list plan directory {path}: {message}")]
    ListFailed { path: PathBuf, message: String },
}

/// Errors from the review orchestrator.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Step {step} was restarted {restarts} times, exceeding the limit of {limit}")]
    RestartLimit {
        step: String,
        restarts: u32,
        limit: u32,
    },

    #[error("Failed to write review output to {path}: {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Checkpoint failed: {0}")]
    Checkpoint(#[source] anyhow::Error),

    #[error(transparent)]
    Tool(#[from] ToolError),
}
