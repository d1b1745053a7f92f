//! Prompt templates for the review steps.
//!
//! Every prompt shares the same frame: a header naming the step and phase, the
//! phase file to read, the accumulated run context and, within a phase, the
//! output of the previous step. The step-specific instructions sit in between.

use std::path::Path;

use super::StepKind;

/// Everything a prompt is built from.
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub step: StepKind,
    pub phase_label: &'a str,
    pub phase_path: &'a Path,
    /// Free text accumulated across the run
    pub context: &'a str,
    /// Output of the preceding step in the same phase
    pub previous_output: Option<&'a str>,
}

/// Build the full prompt for one step.
pub fn build_step_prompt(input: &PromptInput<'_>) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "# {} Step: {}\n\n\
         You are working on the plan phase **{}** defined in `{}`.\n\
         Read that file before doing anything else.\n\n",
        title(input.step),
        input.phase_label,
        input.phase_label,
        input.phase_path.display()
    ));

    if !input.context.trim().is_empty() {
        prompt.push_str("## Context\n\n");
        prompt.push_str(input.context.trim());
        prompt.push_str("\n\n");
    }

    if let Some(previous) = input.previous_output
        && !previous.trim().is_empty()
    {
        prompt.push_str("## Previous Step Output\n\n");
        prompt.push_str(previous.trim());
        prompt.push_str("\n\n");
    }

    prompt.push_str("## Instructions\n\n");
    prompt.push_str(instructions(input.step));
    prompt
}

fn title(step: StepKind) -> &'static str {
    match step {
        StepKind::Research => "Research",
        StepKind::Planning => "Planning",
        StepKind::Review => "Review",
    }
}

fn instructions(step: StepKind) -> &'static str {
    match step {
        StepKind::Research => {
            r#"Investigate the codebase areas this phase touches. Identify the relevant
files, existing patterns, dependencies and risks. Do not modify any files.

Finish with a concise summary of your findings."#
        }
        StepKind::Planning => {
            r#"Using the phase file and the research so far, produce a concrete,
ordered implementation plan: the files to change, the changes to make in each,
and how the result will be verified. Do not modify any files.

Finish with the plan as a numbered list."#
        }
        StepKind::Review => {
            r#"Review the plan for this phase for gaps, ordering problems, missing
tests and risky assumptions.

Record the outcome as a beads issue (`bd create ...`) that captures the reviewed
plan and any follow-ups, then report the identifier of the created issue on its
own line, for example:

Created beads-abc123"#
        }
    }
}
