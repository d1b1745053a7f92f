//! Checkpoint gate between review steps.
//!
//! After each successful step the gate either pauses for a human decision
//! (`Interactive`) or resolves immediately to `continue` (`AutoApprove`). The
//! outcome is written into the step's [`StepData`](crate::step::StepData):
//!
//! | Decision   | Recorded as                 | Orchestrator reaction          |
//! |------------|-----------------------------|--------------------------------|
//! | `continue` | `user_action = "continue"`  | Run the next step              |
//! | `exit`     | `user_exit = true`          | Stop the run (not a failure)   |
//! | `restart`  | `needs_restart = true`      | Run the same step again        |

use anyhow::{Context, Result};
use dialoguer::{Input, Select, theme::ColorfulTheme};
use serde::{Deserialize, Serialize};

use crate::step::{StepKind, StepResult};

/// Whether checkpoints pause for a human.
///
/// Fixed for the lifetime of a review run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutonomyMode {
    /// Pause at every checkpoint (default)
    #[default]
    Interactive,
    /// Never pause; every checkpoint resolves to `continue`
    AutoApprove,
}

impl std::fmt::Display for AutonomyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AutonomyMode::Interactive => write!(f, "interactive"),
            AutonomyMode::AutoApprove => write!(f, "auto-approve"),
        }
    }
}

impl std::str::FromStr for AutonomyMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "interactive" => Ok(AutonomyMode::Interactive),
            "auto-approve" | "auto" => Ok(AutonomyMode::AutoApprove),
            _ => anyhow::bail!(
                "Invalid autonomy mode '{}'. Valid values: interactive, auto-approve",
                s
            ),
        }
    }
}

/// The closed set of actions a checkpoint can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserAction {
    Continue,
    Exit,
    Restart,
}

impl std::fmt::Display for UserAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserAction::Continue => write!(f, "continue"),
            UserAction::Exit => write!(f, "exit"),
            UserAction::Restart => write!(f, "restart"),
        }
    }
}

impl std::str::FromStr for UserAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "continue" | "c" => Ok(UserAction::Continue),
            "exit" | "e" | "quit" | "q" => Ok(UserAction::Exit),
            "restart" | "r" => Ok(UserAction::Restart),
            _ => anyhow::bail!(
                "Invalid action '{}'. Valid values: continue, exit, restart",
                s
            ),
        }
    }
}

/// What the human sees when a checkpoint pauses.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub step: StepKind,
    pub phase_label: String,
    pub beads_id: Option<String>,
    pub output_preview: String,
}

/// A resolved checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub action: UserAction,
    /// Free text to append to the context fed to later steps
    pub additional_context: Option<String>,
}

impl Decision {
    pub fn new(action: UserAction) -> Self {
        Self {
            action,
            additional_context: None,
        }
    }

    pub fn with_context(action: UserAction, context: impl Into<String>) -> Self {
        Self {
            action,
            additional_context: Some(context.into()),
        }
    }
}

/// Source of human decisions for interactive checkpoints.
///
/// Real implementation: [`TerminalPrompt`]. Tests use scripted sources.
pub trait DecisionSource: Send {
    fn decide(&mut self, checkpoint: &Checkpoint) -> Result<Decision>;
}

/// Prompts on the terminal with `dialoguer`.
#[derive(Default)]
pub struct TerminalPrompt;

impl DecisionSource for TerminalPrompt {
    fn decide(&mut self, checkpoint: &Checkpoint) -> Result<Decision> {
        let theme = ColorfulTheme::default();

        eprintln!();
        eprintln!(
            "  {} {} finished for {}",
            console::style("Checkpoint:").bold(),
            console::style(checkpoint.step).cyan(),
            console::style(&checkpoint.phase_label).yellow()
        );
        if let Some(id) = &checkpoint.beads_id {
            eprintln!("  Issue: {}", console::style(id).green());
        }
        if !checkpoint.output_preview.is_empty() {
            eprintln!("  {}", console::style(&checkpoint.output_preview).dim());
        }

        let options = &[
            "Continue to the next step",
            "Restart this step",
            "Exit the review",
        ];

        let selection = Select::with_theme(&theme)
            .with_prompt("How do you want to proceed?")
            .items(options)
            .default(0)
            .interact()
            .context("Failed to read checkpoint decision")?;

        let action = match selection {
            0 => UserAction::Continue,
            1 => UserAction::Restart,
            2 => UserAction::Exit,
            _ => unreachable!(),
        };

        if action == UserAction::Exit {
            return Ok(Decision::new(action));
        }

        let extra: String = Input::with_theme(&theme)
            .with_prompt("Additional context (optional)")
            .allow_empty(true)
            .interact_text()
            .context("Failed to read additional context")?;

        let extra = extra.trim();
        Ok(if extra.is_empty() {
            Decision::new(action)
        } else {
            Decision::with_context(action, extra)
        })
    }
}

/// Decides continuation after each step.
pub struct CheckpointGate {
    mode: AutonomyMode,
    source: Option<Box<dyn DecisionSource>>,
}

impl CheckpointGate {
    pub fn new(mode: AutonomyMode, source: Box<dyn DecisionSource>) -> Self {
        Self {
            mode,
            source: Some(source),
        }
    }

    /// A gate that never pauses.
    pub fn auto_approve() -> Self {
        Self {
            mode: AutonomyMode::AutoApprove,
            source: None,
        }
    }

    /// Resolve the checkpoint for `result`, recording the outcome in its data.
    ///
    /// Exactly one of `user_action`, `user_exit` or `needs_restart` is set.
    pub fn resolve(&mut self, checkpoint: &Checkpoint, result: &mut StepResult) -> Result<()> {
        let decision = match self.mode {
            AutonomyMode::AutoApprove => {
                tracing::info!(
                    step = %checkpoint.step,
                    phase = %checkpoint.phase_label,
                    "checkpoint auto-approved"
                );
                Decision::new(UserAction::Continue)
            }
            AutonomyMode::Interactive => {
                let source = self
                    .source
                    .as_mut()
                    .context("Interactive checkpoint has no decision source")?;
                let decision = source.decide(checkpoint)?;
                tracing::info!(
                    step = %checkpoint.step,
                    phase = %checkpoint.phase_label,
                    action = %decision.action,
                    "checkpoint resolved"
                );
                decision
            }
        };

        apply_decision(decision, result);
        Ok(())
    }
}

fn apply_decision(decision: Decision, result: &mut StepResult) {
    match decision.action {
        UserAction::Continue => result.data.user_action = Some(UserAction::Continue),
        UserAction::Exit => result.data.user_exit = Some(true),
        UserAction::Restart => result.data.needs_restart = Some(true),
    }
    if let Some(context) = decision.additional_context
        && !context.trim().is_empty()
    {
        result.data.additional_context = Some(context);
    }
}
