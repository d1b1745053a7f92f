//! Review orchestration: the input and output contract of a review run and the
//! driver that turns one into the other.

pub mod report;
pub mod review;

pub use report::ReviewReport;
pub use review::ReviewOrchestrator;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::gate::AutonomyMode;

/// Input to a review run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Root that relative plan and output paths are taken from
    pub project_path: PathBuf,
    /// Directory of phase files, or a single phase file
    pub plan_path: PathBuf,
    /// Phase selector: number, file name, stem or label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// Run only this step of each selected phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    /// Where to write the Markdown report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(default)]
    pub autonomy: AutonomyMode,
    /// Review every phase in plan order instead of one targeted phase
    #[serde(default)]
    pub all_phases: bool,
    /// Context fed to the first step
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub initial_context: String,
    /// Restarts allowed per step; absent means unbounded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_restarts: Option<u32>,
}

/// Output of a review run.
///
/// `success` is true both for a completed run and for one the human stopped at
/// a checkpoint; `exited` tells the two apart. `failed_at` is empty unless a
/// step failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewResult {
    pub success: bool,
    pub output: String,
    pub error: String,
    /// `<phase file name>:<step>` of the failed step
    pub failed_at: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exited: bool,
    /// Issue identifiers discovered, in the order they were found
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
    /// Step executions, restarts included
    #[serde(default, skip_serializing_if = "is_zero")]
    pub steps_run: u32,
}

impl ReviewConfig {
    /// `path` as seen from the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_path.join(path)
        }
    }
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl ReviewResult {
    /// A failed run that never executed a step.
    pub fn configuration_failure(error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            error: error.to_string(),
            ..Default::default()
        }
    }
}
