//! Executes a single step against a phase and passes it through the gate.

use std::sync::Arc;

use super::prompts::{PromptInput, build_step_prompt};
use super::{StepKind, StepResult};
use crate::errors::ReviewError;
use crate::gate::{Checkpoint, CheckpointGate};
use crate::parser::extract_beads_id;
use crate::plan::PhaseFile;
use crate::stream::preview;
use crate::tool::{AssistantTool, ToolRequest};
use crate::ui::ReviewUI;

/// Maximum characters of output shown at a checkpoint.
const PREVIEW_CHARS: usize = 160;

/// What to run: one step of one phase, with the context accumulated so far.
#[derive(Debug, Clone, Copy)]
pub struct StepTarget<'a> {
    pub phase: &'a PhaseFile,
    pub step: StepKind,
    /// 1-based; greater than 1 after a restart
    pub attempt: u32,
    pub context: &'a str,
    pub previous_output: Option<&'a str>,
}

impl StepTarget<'_> {
    /// `<phase file name>:<step>`, the identifier reported on failure.
    pub fn name(&self) -> String {
        format!("{}:{}", self.phase.file_name, self.step)
    }
}

pub struct StepRunner {
    tool: Arc<dyn AssistantTool>,
    gate: CheckpointGate,
    ui: Option<Arc<ReviewUI>>,
}

impl StepRunner {
    pub fn new(tool: Arc<dyn AssistantTool>, gate: CheckpointGate) -> Self {
        Self {
            tool,
            gate,
            ui: None,
        }
    }

    pub fn with_ui(mut self, ui: Arc<ReviewUI>) -> Self {
        self.ui = Some(ui);
        self
    }

    /// Run one step and resolve its checkpoint.
    ///
    /// Never returns an error: every failure is recorded on the result. The
    /// gate is only consulted when the step itself succeeded.
    pub async fn run_step(&mut self, target: &StepTarget<'_>) -> StepResult {
        let mut result = StepResult::new();
        let phase_label = target.phase.label.as_str();
        result.data.phase_name = Some(phase_label.to_string());

        tracing::info!(
            phase = %target.phase.file_name,
            step = %target.step,
            attempt = target.attempt,
            "starting step"
        );
        if let Some(ui) = &self.ui {
            ui.start_step(phase_label, target.step, target.attempt);
        }

        let request = ToolRequest {
            step: target.step,
            phase_file: target.phase.file_name.clone(),
            prompt: build_step_prompt(&PromptInput {
                step: target.step,
                phase_label,
                phase_path: &target.phase.path,
                context: target.context,
                previous_output: target.previous_output,
            }),
            attempt: target.attempt,
        };

        match self.tool.invoke(&request).await {
            Err(e) => result.set_error(Some(ReviewError::Tool(e))),
            Ok(output) if !output.success => result.set_error(output.diagnostic),
            Ok(output) if output.text.trim().is_empty() => {
                result.set_error(Some("assistant returned no output"))
            }
            Ok(output) => {
                let beads_id = extract_beads_id(&output.text);
                if !beads_id.is_empty() {
                    tracing::debug!(beads_id = %beads_id, "found issue identifier");
                    result.data.beads_id = Some(beads_id);
                }
                result.data.output = Some(output.text);
            }
        }

        if !result.success {
            tracing::warn!(
                step = %target.name(),
                error = %result.error,
                "step failed"
            );
            if let Some(ui) = &self.ui {
                ui.step_failed(phase_label, target.step, &result.error);
            }
            return result;
        }

        if let Some(ui) = &self.ui {
            ui.step_done(phase_label, target.step, result.data.beads_id.as_deref());
        }

        let checkpoint = Checkpoint {
            step: target.step,
            phase_label: phase_label.to_string(),
            beads_id: result.data.beads_id.clone(),
            output_preview: result
                .data
                .output
                .as_deref()
                .map(|text| preview(text, PREVIEW_CHARS))
                .unwrap_or_default(),
        };
        if let Err(e) = self.gate.resolve(&checkpoint, &mut result) {
            result.set_error(Some(ReviewError::Checkpoint(e)));
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::testing::ScriptedDecisions;
    use crate::gate::{AutonomyMode, Decision, UserAction};
    use crate::tool::ToolOutput;
    use crate::tool::testing::ScriptedTool;
    use std::path::PathBuf;

    fn phase() -> PhaseFile {
        PhaseFile::from_path(PathBuf::from("plans/01-phase-1-setup.md"))
    }

    fn target(phase: &PhaseFile, step: StepKind) -> StepTarget<'_> {
        StepTarget {
            phase,
            step,
            attempt: 1,
            context: "",
            previous_output: None,
        }
    }

    fn auto_runner(tool: &ScriptedTool) -> StepRunner {
        StepRunner::new(Arc::new(tool.clone()), CheckpointGate::auto_approve())
    }

    #[tokio::test]
    async fn test_successful_step_records_output_and_beads_id() {
        let tool = ScriptedTool::always("Creating issue...\nCreated beads-xyz789\nDone", 1);
        let phase = phase();
        let result = auto_runner(&tool)
            .run_step(&target(&phase, StepKind::Review))
            .await;

        assert!(result.success);
        assert_eq!(result.data.beads_id.as_deref(), Some("beads-xyz789"));
        assert_eq!(result.data.phase_name.as_deref(), Some("1 Setup"));
        assert!(result.data.output.as_deref().unwrap().contains("Done"));
        assert!(result.data.continued());
    }

    #[tokio::test]
    async fn test_no_beads_id_leaves_field_absent() {
        let tool = ScriptedTool::always("Nothing to report", 1);
        let phase = phase();
        let result = auto_runner(&tool)
            .run_step(&target(&phase, StepKind::Research))
            .await;

        assert!(result.success);
        assert!(result.data.beads_id.is_none());
    }

    #[tokio::test]
    async fn test_request_carries_step_phase_and_prompt() {
        let tool = ScriptedTool::always("ok", 1);
        let phase = phase();
        let mut target = target(&phase, StepKind::Planning);
        target.attempt = 2;
        target.context = "Initial context";
        target.previous_output = Some("research notes");
        auto_runner(&tool).run_step(&target).await;

        let request = tool.request(0);
        assert_eq!(request.step, StepKind::Planning);
        assert_eq!(request.phase_file, "01-phase-1-setup.md");
        assert_eq!(request.attempt, 2);
        assert!(request.prompt.contains("Initial context"));
        assert!(request.prompt.contains("research notes"));
    }

    #[tokio::test]
    async fn test_tool_failure_with_diagnostic() {
        let tool = ScriptedTool::new(vec![ToolOutput::failure(
            "",
            Some("rate limited".into()),
        )]);
        let phase = phase();
        let result = auto_runner(&tool)
            .run_step(&target(&phase, StepKind::Research))
            .await;

        assert!(!result.success);
        assert_eq!(result.error, "rate limited");
        assert!(result.data.user_action.is_none(), "gate skipped on failure");
    }

    #[tokio::test]
    async fn test_tool_failure_without_diagnostic_is_undiagnosed() {
        let tool = ScriptedTool::new(vec![ToolOutput::failure("partial", None)]);
        let phase = phase();
        let result = auto_runner(&tool)
            .run_step(&target(&phase, StepKind::Research))
            .await;

        assert!(result.is_undiagnosed_failure());
    }

    #[tokio::test]
    async fn test_tool_error_is_described_failure() {
        let tool = ScriptedTool::new(vec![]);
        tool.push_error("claude not found");
        let phase = phase();
        let result = auto_runner(&tool)
            .run_step(&target(&phase, StepKind::Research))
            .await;

        assert!(!result.success);
        assert!(result.error.contains("claude not found"));
    }

    #[tokio::test]
    async fn test_blank_output_is_failure() {
        let tool = ScriptedTool::always("  \n", 1);
        let phase = phase();
        let result = auto_runner(&tool)
            .run_step(&target(&phase, StepKind::Research))
            .await;

        assert!(!result.success);
        assert_eq!(result.error, "assistant returned no output");
    }

    #[tokio::test]
    async fn test_interactive_checkpoint_sees_preview() {
        let tool = ScriptedTool::always("Created beads-abc123\nmore detail", 1);
        let decisions = ScriptedDecisions::new(vec![Decision::with_context(
            UserAction::Restart,
            "Cover the rollback path",
        )]);
        let gate = CheckpointGate::new(AutonomyMode::Interactive, Box::new(decisions.clone()));
        let mut runner = StepRunner::new(Arc::new(tool.clone()), gate);
        let phase = phase();
        let result = runner.run_step(&target(&phase, StepKind::Review)).await;

        assert!(result.success);
        assert!(result.data.restart_requested());
        assert_eq!(
            result.data.additional_context.as_deref(),
            Some("Cover the rollback path")
        );
        let seen = decisions.seen.lock().unwrap();
        assert_eq!(seen[0].output_preview, "Created beads-abc123");
        assert_eq!(seen[0].beads_id.as_deref(), Some("beads-abc123"));
    }

    #[tokio::test]
    async fn test_failed_step_does_not_prompt() {
        let tool = ScriptedTool::new(vec![ToolOutput::failure("", None)]);
        let decisions = ScriptedDecisions::actions(&[UserAction::Continue]);
        let gate = CheckpointGate::new(AutonomyMode::Interactive, Box::new(decisions.clone()));
        let mut runner = StepRunner::new(Arc::new(tool), gate);
        let phase = phase();
        runner.run_step(&target(&phase, StepKind::Research)).await;

        assert_eq!(decisions.prompts(), 0);
    }

    #[tokio::test]
    async fn test_gate_error_fails_step() {
        let tool = ScriptedTool::always("ok", 1);
        let decisions = ScriptedDecisions::actions(&[]);
        let gate = CheckpointGate::new(AutonomyMode::Interactive, Box::new(decisions));
        let mut runner = StepRunner::new(Arc::new(tool), gate);
        let phase = phase();
        let result = runner.run_step(&target(&phase, StepKind::Research)).await;

        assert!(!result.success);
        assert!(result.error.starts_with("Checkpoint failed"));
    }

    #[test]
    fn test_target_name() {
        let phase = phase();
        assert_eq!(
            target(&phase, StepKind::Review).name(),
            "01-phase-1-setup.md:review"
        );
    }
}
