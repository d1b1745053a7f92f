//! Markdown summary of a review run.

use chrono::{DateTime, Utc};
use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::errors::ReviewError;
use crate::step::StepKind;

/// A step that finished and passed its checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedStep {
    pub phase_label: String,
    pub phase_file: String,
    pub step: StepKind,
    pub beads_id: Option<String>,
    pub attempts: u32,
}

/// Accumulates completed steps and renders them as Markdown.
#[derive(Debug, Clone)]
pub struct ReviewReport {
    plan_path: PathBuf,
    started_at: DateTime<Utc>,
    steps: Vec<CompletedStep>,
}

impl ReviewReport {
    pub fn new(plan_path: &Path) -> Self {
        Self {
            plan_path: plan_path.to_path_buf(),
            started_at: Utc::now(),
            steps: Vec::new(),
        }
    }

    pub fn record(&mut self, step: CompletedStep) {
        self.steps.push(step);
    }

    /// Issue identifiers in discovery order, without duplicates.
    pub fn issues(&self) -> Vec<String> {
        let mut issues: Vec<String> = Vec::new();
        for id in self.steps.iter().filter_map(|s| s.beads_id.as_ref()) {
            if !issues.contains(id) {
                issues.push(id.clone());
            }
        }
        issues
    }

    /// Render the report. `footer` is appended verbatim when non-empty.
    pub fn render(&self, footer: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Review Report\n");
        let _ = writeln!(out, "- **Plan**: `{}`", self.plan_path.display());
        let _ = writeln!(out, "- **Started**: {}", self.started_at.to_rfc3339());
        let _ = writeln!(out, "- **Steps completed**: {}", self.steps.len());

        let mut current_phase: Option<&str> = None;
        for step in &self.steps {
            if current_phase != Some(step.phase_file.as_str()) {
                let _ = writeln!(out, "\n## {} (`{}`)\n", step.phase_label, step.phase_file);
                current_phase = Some(step.phase_file.as_str());
            }
            let _ = write!(out, "- {}", step.step);
            if let Some(id) = &step.beads_id {
                let _ = write!(out, ": {}", id);
            }
            if step.attempts > 1 {
                let _ = write!(out, " (after {} attempts)", step.attempts);
            }
            out.push('\n');
        }

        if !footer.is_empty() {
            let _ = writeln!(out, "\n{}", footer);
        }
        out
    }

    pub fn write_to(&self, path: &Path, footer: &str) -> Result<(), ReviewError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| ReviewError::OutputWriteFailed {
                path: path.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, self.render(footer)).map_err(|source| {
            ReviewError::OutputWriteFailed {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn completed(file: &str, label: &str, step: StepKind, id: Option<&str>) -> CompletedStep {
        CompletedStep {
            phase_label: label.into(),
            phase_file: file.into(),
            step,
            beads_id: id.map(String::from),
            attempts: 1,
        }
    }

    #[test]
    fn test_render_groups_steps_by_phase() {
        let mut report = ReviewReport::new(Path::new("plans"));
        report.record(completed("01-phase-1-setup.md", "1 Setup", StepKind::Research, None));
        report.record(completed(
            "01-phase-1-setup.md",
            "1 Setup",
            StepKind::Review,
            Some("beads-abc123"),
        ));
        report.record(completed("02-implement-feature.md", "Feature", StepKind::Review, None));

        let text = report.render("");
        assert!(text.starts_with("# Review Report"));
        assert!(text.contains("- **Steps completed**: 3"));
        assert_eq!(text.matches("## 1 Setup").count(), 1);
        assert!(text.contains("- review: beads-abc123"));
        assert!(text.contains("## Feature (`02-implement-feature.md`)"));
    }

    #[test]
    fn test_render_notes_restarts_and_footer() {
        let mut report = ReviewReport::new(Path::new("plans"));
        let mut step = completed("simple.md", "simple", StepKind::Planning, None);
        step.attempts = 3;
        report.record(step);

        let text = report.render("Stopped at checkpoint.");
        assert!(text.contains("- planning (after 3 attempts)"));
        assert!(text.trim_end().ends_with("Stopped at checkpoint."));
    }

    #[test]
    fn test_issues_are_deduplicated_in_order() {
        let mut report = ReviewReport::new(Path::new("plans"));
        report.record(completed("a.md", "a", StepKind::Review, Some("beads-2")));
        report.record(completed("b.md", "b", StepKind::Review, Some("beads-1")));
        report.record(completed("c.md", "c", StepKind::Review, Some("beads-2")));

        assert_eq!(report.issues(), vec!["beads-2", "beads-1"]);
    }

    #[test]
    fn test_write_to_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/review.md");
        let report = ReviewReport::new(Path::new("plans"));
        report.write_to(&path, "").unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("- **Steps completed**: 0"));
    }
}
