//! Drives the step sequence of a review run.
//!
//! Steps run strictly one after another. For each selected phase the
//! configured steps run in order; after every successful step the checkpoint
//! gate decides whether to continue, stop the run or run the step again.

use std::sync::Arc;

use super::report::{CompletedStep, ReviewReport};
use super::{ReviewConfig, ReviewResult};
use crate::errors::{PlanError, ReviewError};
use crate::gate::{AutonomyMode, CheckpointGate, DecisionSource, TerminalPrompt};
use crate::parser::combine_context;
use crate::plan::{PhaseFile, PhaseSource, PlanDir, resolve_phase};
use crate::step::{StepKind, StepRunner, StepTarget};
use crate::tool::AssistantTool;
use crate::ui::ReviewUI;

/// How a run ended, before it is folded into a [`ReviewResult`].
enum Outcome {
    Completed,
    Exited { at: String },
    Failed { at: String, error: String },
}

pub struct ReviewOrchestrator {
    tool: Arc<dyn AssistantTool>,
    decisions: Box<dyn DecisionSource>,
    phase_source: Option<Box<dyn PhaseSource + Send>>,
    steps: Vec<StepKind>,
    ui: Option<Arc<ReviewUI>>,
}

impl ReviewOrchestrator {
    /// Orchestrator prompting on the terminal for interactive checkpoints.
    pub fn new(tool: Arc<dyn AssistantTool>) -> Self {
        Self {
            tool,
            decisions: Box::new(TerminalPrompt),
            phase_source: None,
            steps: StepKind::ALL.to_vec(),
            ui: None,
        }
    }

    pub fn with_decisions(mut self, decisions: Box<dyn DecisionSource>) -> Self {
        self.decisions = decisions;
        self
    }

    /// List phases from `source` instead of the plan path.
    pub fn with_phase_source(mut self, source: Box<dyn PhaseSource + Send>) -> Self {
        self.phase_source = Some(source);
        self
    }

    /// Steps run for each phase, in order.
    pub fn with_steps(mut self, steps: Vec<StepKind>) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_ui(mut self, ui: Arc<ReviewUI>) -> Self {
        self.ui = Some(ui);
        self
    }

    /// Execute the review described by `config`.
    ///
    /// Never returns an error: configuration problems and step failures are
    /// both reported through the result.
    pub async fn run(self, config: ReviewConfig) -> ReviewResult {
        let (phases, steps) = match self.plan(&config) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::warn!(error = %e, "review configuration failed");
                if let Some(ui) = &self.ui {
                    ui.finish(false, false);
                }
                return ReviewResult::configuration_failure(e);
            }
        };

        tracing::info!(
            plan = %config.plan_path.display(),
            phases = phases.len(),
            steps = steps.len(),
            autonomy = %config.autonomy,
            "starting review"
        );

        let gate = match config.autonomy {
            AutonomyMode::AutoApprove => CheckpointGate::auto_approve(),
            AutonomyMode::Interactive => CheckpointGate::new(config.autonomy, self.decisions),
        };
        let mut runner = StepRunner::new(self.tool, gate);
        if let Some(ui) = &self.ui {
            ui.set_total((phases.len() * steps.len()) as u64);
            runner = runner.with_ui(Arc::clone(ui));
        }

        let mut report = ReviewReport::new(&config.plan_path);
        let mut context = config.initial_context.clone();
        let mut steps_run = 0u32;
        let mut outcome = Outcome::Completed;

        'phases: for phase in &phases {
            let mut previous_output: Option<String> = None;

            for &step in &steps {
                let mut restarts = 0u32;
                loop {
                    let target = StepTarget {
                        phase,
                        step,
                        attempt: restarts + 1,
                        context: &context,
                        previous_output: previous_output.as_deref(),
                    };
                    let name = target.name();
                    let result = runner.run_step(&target).await;
                    steps_run += 1;

                    if !result.success {
                        outcome = Outcome::Failed {
                            at: name,
                            error: result.error,
                        };
                        break 'phases;
                    }

                    if let Some(extra) = result.data.additional_context.as_deref() {
                        context = combine_context(&context, extra);
                        tracing::debug!(context_chars = context.len(), "context extended");
                    }

                    if result.data.restart_requested() {
                        restarts += 1;
                        if let Some(limit) = config.max_restarts
                            && restarts > limit
                        {
                            let error = ReviewError::RestartLimit {
                                step: name.clone(),
                                restarts,
                                limit,
                            };
                            outcome = Outcome::Failed {
                                at: name,
                                error: error.to_string(),
                            };
                            break 'phases;
                        }
                        tracing::warn!(step = %name, restarts, "restarting step");
                        if let Some(ui) = &self.ui {
                            ui.step_restarting(&phase.label, step);
                        }
                        continue;
                    }

                    report.record(CompletedStep {
                        phase_label: phase.label.clone(),
                        phase_file: phase.file_name.clone(),
                        step,
                        beads_id: result.data.beads_id.clone(),
                        attempts: restarts + 1,
                    });

                    if result.data.user_exited() {
                        tracing::info!(step = %name, "review stopped at checkpoint");
                        outcome = Outcome::Exited { at: name };
                        break 'phases;
                    }

                    previous_output = result.data.output;
                    break;
                }
            }
        }

        let result = finish(&config, &report, outcome, steps_run);
        if let Some(ui) = &self.ui {
            ui.finish(result.success, result.exited);
        }
        result
    }

    /// Resolve the phases and steps the run covers.
    fn plan(&self, config: &ReviewConfig) -> Result<(Vec<PhaseFile>, Vec<StepKind>), PlanError> {
        let phases = match &self.phase_source {
            Some(source) => source.phases()?,
            None => PlanDir::new(config.resolve(&config.plan_path)).phases()?,
        };
        if phases.is_empty() {
            return Err(PlanError::NoPhases(config.plan_path.clone()));
        }

        let phases = if config.all_phases {
            phases
        } else if let Some(selector) = &config.phase {
            vec![resolve_phase(&phases, selector)?.clone()]
        } else if phases.len() == 1 {
            phases
        } else {
            return Err(PlanError::PhaseSelectorRequired {
                count: phases.len(),
            });
        };

        let steps = match &config.step {
            Some(selector) => vec![selector.parse::<StepKind>()?],
            None => self.steps.clone(),
        };

        Ok((phases, steps))
    }
}

/// Fold the outcome into a result and write the report when asked to.
fn finish(
    config: &ReviewConfig,
    report: &ReviewReport,
    outcome: Outcome,
    steps_run: u32,
) -> ReviewResult {
    let footer = match &outcome {
        Outcome::Completed => String::new(),
        Outcome::Exited { at } => format!("Stopped at checkpoint after `{}`.", at),
        Outcome::Failed { at, error } if error.is_empty() => {
            format!("Failed at `{}`.", at)
        }
        Outcome::Failed { at, error } => format!("Failed at `{}`: {}", at, error),
    };

    let mut result = ReviewResult {
        success: true,
        output: report.render(&footer),
        issues: report.issues(),
        steps_run,
        ..Default::default()
    };

    match outcome {
        Outcome::Completed => {}
        Outcome::Exited { .. } => result.exited = true,
        Outcome::Failed { at, error } => {
            result.success = false;
            result.error = error;
            result.failed_at = at;
        }
    }

    if result.success
        && let Some(path) = &config.output_path
        && let Err(e) = report.write_to(&config.resolve(path), &footer)
    {
        tracing::warn!(error = %e, "failed to write review report");
        result.success = false;
        result.error = e.to_string();
    }

    result
}
