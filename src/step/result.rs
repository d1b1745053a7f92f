//! Outcome envelope produced by every executed step.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;

use crate::gate::UserAction;

/// Metadata recorded on a step by the step body and the checkpoint gate.
///
/// Every key is optional: an unset field means "absent" and readers go through
/// the accessor methods rather than assuming a value is present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepData {
    /// Action resolved at the checkpoint (`continue` is the only action stored here)
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub user_action: Option<UserAction>,
    /// The human asked to stop the whole run
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub user_exit: Option<bool>,
    /// The step must be executed again from scratch
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub needs_restart: Option<bool>,
    /// Issue identifier found in the assistant output (e.g. `beads-abc123`)
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub beads_id: Option<String>,
    /// Human-readable label of the phase the step ran against
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub phase_name: Option<String>,
    /// Raw text returned by the assistant
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Free text supplied at the checkpoint, to be appended to the run context
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
}

/// Deserialize a field, treating a value of the wrong type as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl StepData {
    pub fn user_exited(&self) -> bool {
        self.user_exit.unwrap_or(false)
    }

    pub fn restart_requested(&self) -> bool {
        self.needs_restart.unwrap_or(false)
    }

    pub fn continued(&self) -> bool {
        self.user_action == Some(UserAction::Continue)
    }
}

/// Outcome of one executed step.
///
/// Created fresh for each attempt, mutated by the step body and the checkpoint
/// gate, then consumed by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    /// Empty unless the step failed with a described cause.
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub data: StepData,
}

impl StepResult {
    pub fn new() -> Self {
        Self {
            success: true,
            error: String::new(),
            data: StepData::default(),
        }
    }

    /// Mark the step as failed.
    ///
    /// `None` records an undiagnosed failure: `success` is false and `error`
    /// stays empty.
    pub fn set_error<E: Display>(&mut self, cause: Option<E>) {
        self.success = false;
        if let Some(cause) = cause {
            self.error = cause.to_string();
        }
    }

    /// True for a failure that carries no description.
    pub fn is_undiagnosed_failure(&self) -> bool {
        !self.success && self.error.is_empty()
    }
}

impl Default for StepResult {
    fn default() -> Self {
        Self::new()
    }
}
