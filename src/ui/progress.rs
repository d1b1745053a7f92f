use crate::step::StepKind;
use crate::stream::Activity;
use crate::ui::icons::{CHECK, CROSS, ISSUE, RESTART, STOP};
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

/// Terminal UI for a review run, rendered via `indicatif` progress bars on stderr.
///
/// Two bars are stacked vertically:
/// - Steps bar: how many planned steps have completed
/// - Step spinner: the running step and the assistant's latest activity
pub struct ReviewUI {
    multi: MultiProgress,
    steps_bar: ProgressBar,
    step_spinner: ProgressBar,
    verbose: bool,
}

impl ReviewUI {
    /// Create the UI sized for `total_steps` planned steps.
    pub fn new(total_steps: u64, verbose: bool) -> Self {
        let multi = MultiProgress::new();

        let steps_style = ProgressStyle::default_bar()
            .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("progress bar template is a valid static string")
            .progress_chars("█▓▒░");

        let steps_bar = multi.add(ProgressBar::new(total_steps));
        steps_bar.set_style(steps_style);
        steps_bar.set_prefix("Steps");

        let spinner_style = ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {msg}")
            .expect("progress bar template is a valid static string");

        let step_spinner = multi.add(ProgressBar::new_spinner());
        step_spinner.set_style(spinner_style);
        step_spinner.set_prefix(" Step");

        Self {
            multi,
            steps_bar,
            step_spinner,
            verbose,
        }
    }

    /// Resize the steps bar once the run has been planned.
    pub fn set_total(&self, total_steps: u64) {
        self.steps_bar.set_length(total_steps);
    }

    /// Print a line via `MultiProgress`, falling back to `eprintln!` if the rich UI fails.
    fn print_line(&self, msg: impl AsRef<str>) {
        if self.multi.println(msg.as_ref()).is_err() {
            eprintln!("{}", msg.as_ref());
        }
    }

    /// Start the spinner for a step.
    pub fn start_step(&self, phase_label: &str, step: StepKind, attempt: u32) {
        self.steps_bar
            .set_message(format!("{}: {}", style(phase_label).yellow(), step));
        let attempt_note = if attempt > 1 {
            format!(" (attempt {})", attempt)
        } else {
            String::new()
        };
        self.step_spinner.reset();
        self.step_spinner.set_message(format!(
            "Running {}{}",
            style(step).cyan(),
            style(attempt_note).dim()
        ));
        self.step_spinner
            .enable_steady_tick(Duration::from_millis(100));
    }

    /// Reflect assistant activity on the spinner.
    pub fn show_activity(&self, activity: &Activity) {
        match activity {
            Activity::ToolUse(description) => {
                self.step_spinner
                    .set_message(style(description).yellow().to_string());
                if self.verbose {
                    self.print_line(format!("    {} {}", style("→").dim(), description));
                }
            }
            Activity::Thinking(snippet) => {
                self.step_spinner
                    .set_message(style(format!("💭 {}", snippet)).dim().to_string());
            }
        }
    }

    /// Stop the spinner after a successful step.
    pub fn step_done(&self, phase_label: &str, step: StepKind, beads_id: Option<&str>) {
        self.step_spinner.finish_and_clear();
        self.steps_bar.inc(1);
        let issue = beads_id
            .map(|id| format!(" {}{}", ISSUE, style(id).green()))
            .unwrap_or_default();
        self.print_line(format!("  {}{} {}{}", CHECK, phase_label, step, issue));
    }

    /// Stop the spinner after a failed step.
    pub fn step_failed(&self, phase_label: &str, step: StepKind, error: &str) {
        self.step_spinner.finish_and_clear();
        let detail = if error.is_empty() {
            "failed without a diagnostic".to_string()
        } else {
            error.to_string()
        };
        self.print_line(format!(
            "  {}{} {}: {}",
            CROSS,
            phase_label,
            step,
            style(detail).red()
        ));
    }

    /// Note that a step is about to be re-run.
    pub fn step_restarting(&self, phase_label: &str, step: StepKind) {
        self.print_line(format!(
            "  {}{} {} {}",
            RESTART,
            phase_label,
            step,
            style("restarting").dim()
        ));
    }

    /// Finish the steps bar with a summary.
    pub fn finish(&self, success: bool, exited: bool) {
        let message = if exited {
            format!("{}Stopped at checkpoint", STOP)
        } else if success {
            format!("{}Review complete", CHECK)
        } else {
            format!("{}Review failed", CROSS)
        };
        self.steps_bar.finish_with_message(message);
    }
}
