//! The external assistant collaborator.
//!
//! Steps hand a prompt to an [`AssistantTool`] and get free-form text back plus
//! a success flag. The production implementation shells out to the Claude CLI
//! ([`ClaudeCli`]); tests use scripted tools.

pub mod claude;

pub use claude::ClaudeCli;

use async_trait::async_trait;

use crate::errors::ToolError;
use crate::step::StepKind;

/// One request to the assistant.
#[derive(Debug, Clone)]
pub struct ToolRequest {
    pub step: StepKind,
    /// Plan file the step runs against (e.g. `01-phase-1-setup.md`)
    pub phase_file: String,
    pub prompt: String,
    /// 1-based attempt number; greater than 1 after a restart
    pub attempt: u32,
}

/// What came back from the assistant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    pub success: bool,
    /// Why the call failed, when the tool could tell
    pub diagnostic: Option<String>,
}

impl ToolOutput {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: true,
            diagnostic: None,
        }
    }

    pub fn failure(text: impl Into<String>, diagnostic: Option<String>) -> Self {
        Self {
            text: text.into(),
            success: false,
            diagnostic,
        }
    }
}

/// Abstraction over assistant invocation for testability.
#[async_trait]
pub trait AssistantTool: Send + Sync {
    async fn invoke(&self, request: &ToolRequest) -> Result<ToolOutput, ToolError>;
}
