//! Named review steps and the runner that executes them.
//!
//! A step is one call to the assistant (research, planning or review) against a
//! single phase file. Each execution yields a [`StepResult`] which then passes
//! through the checkpoint gate.

pub mod prompts;
pub mod result;
pub mod runner;

pub use result::{StepData, StepResult};
pub use runner::{StepRunner, StepTarget};

use serde::{Deserialize, Serialize};

use crate::errors::PlanError;

/// One named unit of work run against a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Research,
    Planning,
    Review,
}

impl StepKind {
    /// Default order in which steps run for a phase.
    pub const ALL: [StepKind; 3] = [StepKind::Research, StepKind::Planning, StepKind::Review];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Research => "research",
            StepKind::Planning => "planning",
            StepKind::Review => "review",
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StepKind {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "research" => Ok(StepKind::Research),
            "planning" | "plan" => Ok(StepKind::Planning),
            "review" => Ok(StepKind::Review),
            _ => Err(PlanError::UnknownStep(s.to_string())),
        }
    }
}
