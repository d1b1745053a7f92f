//! Plan files and phase selector resolution.
//!
//! A plan is either a directory of phase files or a single phase file. Phase
//! files follow the `<NN>-<slug>.md` convention and run in file-name order.
//! Only file names are inspected here; the contents are left to the assistant.

use glob::glob;
use serde::Serialize;
use std::path::PathBuf;

use crate::errors::PlanError;
use crate::parser::{extract_phase_name, extract_phase_number};

/// One phase of a plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseFile {
    /// File name, e.g. `01-phase-1-setup.md`
    pub file_name: String,
    pub path: PathBuf,
    /// Numeric ordering prefix, when the name has one
    pub number: Option<u32>,
    /// Human-readable label derived from the file name
    pub label: String,
}

impl PhaseFile {
    pub fn from_path(path: PathBuf) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            number: extract_phase_number(&file_name),
            label: extract_phase_name(&file_name),
            file_name,
            path,
        }
    }

    /// Whether `selector` names this phase.
    ///
    /// Accepts the numeric prefix (`1` or `01`), the file name, its stem, or
    /// the label, ignoring case.
    pub fn matches(&self, selector: &str) -> bool {
        let selector = selector.trim();
        if selector.is_empty() {
            return false;
        }
        if let (Some(number), Ok(wanted)) = (self.number, selector.parse::<u32>()) {
            return number == wanted;
        }
        let stem = self.file_name.strip_suffix(".md").unwrap_or(&self.file_name);
        [self.file_name.as_str(), stem, self.label.as_str()]
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(selector))
    }
}

/// Lists the phases of a plan.
pub trait PhaseSource {
    fn phases(&self) -> Result<Vec<PhaseFile>, PlanError>;
}

/// A plan on disk: a directory of `*.md` phase files or a single file.
pub struct PlanDir {
    path: PathBuf,
}

impl PlanDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PhaseSource for PlanDir {
    fn phases(&self) -> Result<Vec<PhaseFile>, PlanError> {
        if !self.path.exists() {
            return Err(PlanError::PlanNotFound(self.path.clone()));
        }

        if self.path.is_file() {
            return Ok(vec![PhaseFile::from_path(self.path.clone())]);
        }

        let pattern = self.path.join("*.md").to_string_lossy().to_string();
        let mut paths: Vec<PathBuf> = glob(&pattern)
            .map_err(|e| PlanError::ListFailed {
                path: self.path.clone(),
                message: e.to_string(),
            })?
            .filter_map(|entry| entry.ok())
            .filter(|p| p.is_file())
            .collect();

        if paths.is_empty() {
            return Err(PlanError::NoPhases(self.path.clone()));
        }

        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(paths.into_iter().map(PhaseFile::from_path).collect())
    }
}

/// In-memory phase list, in the given order.
impl PhaseSource for Vec<PhaseFile> {
    fn phases(&self) -> Result<Vec<PhaseFile>, PlanError> {
        Ok(self.clone())
    }
}

/// Find the phase named by `selector`.
pub fn resolve_phase<'a>(phases: &'a [PhaseFile], selector: &str) -> Result<&'a PhaseFile, PlanError> {
    phases
        .iter()
        .find(|p| p.matches(selector))
        .ok_or_else(|| PlanError::PhaseNotFound {
            selector: selector.to_string(),
        })
}
