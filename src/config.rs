//! Layered configuration for Waypoint.
//!
//! Settings are read from `.waypoint/waypoint.toml`, then environment
//! variables, then CLI flags (later layers win).
//!
//! # Configuration File Format
//!
//! ```toml
//! [project]
//! name = "my-project"
//! claude_cmd = "claude"
//!
//! [defaults]
//! autonomy = "interactive"      # or "auto-approve"
//! skip_permissions = true
//! max_restarts = 3              # omit for no limit
//! steps = ["research", "planning", "review"]
//!
//! [claude]
//! extra_flags = ["--model", "sonnet"]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::gate::AutonomyMode;
use crate::step::StepKind;

/// Name of the per-project configuration directory.
pub const WAYPOINT_DIR: &str = ".waypoint";

/// Project-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (optional, defaults to directory name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Claude CLI command (default: "claude")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude_cmd: Option<String>,
}

/// Default settings for review runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Whether checkpoints pause for a human
    #[serde(default)]
    pub autonomy: AutonomyMode,
    /// Whether to skip permission prompts for Claude CLI
    #[serde(default = "default_skip_permissions")]
    pub skip_permissions: bool,
    /// Maximum restarts of a single step; absent means no limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_restarts: Option<u32>,
    /// Steps run for each phase, in order
    #[serde(default = "default_steps")]
    pub steps: Vec<StepKind>,
}

fn default_skip_permissions() -> bool {
    true
}

fn default_steps() -> Vec<StepKind> {
    StepKind::ALL.to_vec()
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            autonomy: AutonomyMode::default(),
            skip_permissions: default_skip_permissions(),
            max_restarts: None,
            steps: default_steps(),
        }
    }
}

/// Claude CLI integration settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaudeSection {
    /// Flags appended to every invocation
    #[serde(default)]
    pub extra_flags: Vec<String>,
}

/// The complete waypoint.toml configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaypointToml {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub claude: ClaudeSection,
}

impl WaypointToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse waypoint.toml")
    }

    /// Load `waypoint.toml` from `waypoint_dir`, or defaults if it does not exist.
    pub fn load_or_default(waypoint_dir: &Path) -> Result<Self> {
        let config_path = waypoint_dir.join("waypoint.toml");
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize waypoint.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Get the Claude command, with fallback to environment variable.
    pub fn claude_cmd(&self) -> String {
        self.project
            .claude_cmd
            .clone()
            .or_else(|| std::env::var("CLAUDE_CMD").ok())
            .unwrap_or_else(|| "claude".to_string())
    }

    /// Get skip_permissions, with fallback to environment variable.
    pub fn skip_permissions(&self) -> bool {
        // Environment variable can override file setting
        if let Ok(env_val) = std::env::var("SKIP_PERMISSIONS") {
            return env_val != "false";
        }
        self.defaults.skip_permissions
    }

    /// Get the autonomy mode; `WAYPOINT_AUTONOMY` overrides the file.
    pub fn autonomy(&self) -> AutonomyMode {
        match std::env::var("WAYPOINT_AUTONOMY") {
            Ok(value) => match value.parse() {
                Ok(mode) => mode,
                Err(e) => {
                    tracing::warn!("ignoring WAYPOINT_AUTONOMY: {}", e);
                    self.defaults.autonomy
                }
            },
            Err(_) => self.defaults.autonomy,
        }
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.defaults.steps.is_empty() {
            warnings.push("defaults.steps is empty: no step would run for any phase".to_string());
        }

        let mut seen = Vec::new();
        for step in &self.defaults.steps {
            if seen.contains(step) {
                warnings.push(format!("Step '{}' is listed more than once", step));
            } else {
                seen.push(*step);
            }
        }

        if self.defaults.max_restarts == Some(0) {
            warnings.push(
                "max_restarts = 0 turns every restart request into a failure".to_string(),
            );
        }

        warnings
    }
}

/// Runtime configuration: waypoint.toml merged with environment and CLI flags.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_dir: PathBuf,
    pub waypoint_dir: PathBuf,
    pub log_dir: PathBuf,
    pub toml: WaypointToml,
    pub verbose: bool,
    /// CLI override: auto-approve every checkpoint
    pub yes: bool,
    /// CLI override for max_restarts
    pub cli_max_restarts: Option<u32>,
}

impl Config {
    pub fn new(project_dir: PathBuf, verbose: bool, yes: bool) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let waypoint_dir = project_dir.join(WAYPOINT_DIR);
        let log_dir = waypoint_dir.join("logs");
        let toml = WaypointToml::load_or_default(&waypoint_dir)?;

        Ok(Self {
            project_dir,
            waypoint_dir,
            log_dir,
            toml,
            verbose,
            yes,
            cli_max_restarts: None,
        })
    }

    pub fn with_max_restarts(mut self, max_restarts: Option<u32>) -> Self {
        self.cli_max_restarts = max_restarts;
        self
    }

    /// Path to waypoint.toml (may not exist).
    pub fn config_path(&self) -> PathBuf {
        self.waypoint_dir.join("waypoint.toml")
    }

    pub fn claude_cmd(&self) -> String {
        self.toml.claude_cmd()
    }

    pub fn skip_permissions(&self) -> bool {
        self.toml.skip_permissions()
    }

    /// Autonomy mode (CLI `--yes` → env → file → default).
    pub fn autonomy(&self) -> AutonomyMode {
        if self.yes {
            AutonomyMode::AutoApprove
        } else {
            self.toml.autonomy()
        }
    }

    /// Restart cap (CLI → file → unbounded).
    pub fn max_restarts(&self) -> Option<u32> {
        self.cli_max_restarts.or(self.toml.defaults.max_restarts)
    }

    pub fn steps(&self) -> &[StepKind] {
        &self.toml.defaults.steps
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.log_dir).context("Failed to create log directory")?;
        Ok(())
    }

    /// Generate CLI flags for Claude invocation.
    pub fn claude_flags(&self) -> Vec<String> {
        let mut flags = Vec::new();
        if self.skip_permissions() {
            flags.push("--dangerously-skip-permissions".to_string());
        }
        flags.push("--print".to_string());
        flags.push("--output-format".to_string());
        flags.push("stream-json".to_string());
        flags.push("--verbose".to_string());
        flags.extend(self.toml.claude.extra_flags.iter().cloned());
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_waypoint_toml_parse_empty() {
        let toml = WaypointToml::parse("").unwrap();
        assert!(toml.project.name.is_none());
        assert_eq!(toml.defaults.autonomy, AutonomyMode::Interactive);
        assert!(toml.defaults.skip_permissions);
        assert!(toml.defaults.max_restarts.is_none());
        assert_eq!(toml.defaults.steps, StepKind::ALL.to_vec());
        assert!(toml.claude.extra_flags.is_empty());
    }

    #[test]
    fn test_waypoint_toml_parse_full() {
        let content = r#"
[project]
name = "demo"
claude_cmd = "my-claude"

[defaults]
autonomy = "auto-approve"
skip_permissions = false
max_restarts = 2
steps = ["planning", "review"]

[claude]
extra_flags = ["--model", "sonnet"]
"#;
        let toml = WaypointToml::parse(content).unwrap();
        assert_eq!(toml.project.name.as_deref(), Some("demo"));
        assert_eq!(toml.project.claude_cmd.as_deref(), Some("my-claude"));
        assert_eq!(toml.defaults.autonomy, AutonomyMode::AutoApprove);
        assert!(!toml.defaults.skip_permissions);
        assert_eq!(toml.defaults.max_restarts, Some(2));
        assert_eq!(toml.defaults.steps, vec![StepKind::Planning, StepKind::Review]);
        assert_eq!(toml.claude.extra_flags, vec!["--model", "sonnet"]);
    }

    #[test]
    fn test_waypoint_toml_parse_invalid_step() {
        let content = r#"
[defaults]
steps = ["deploy"]
"#;
        assert!(WaypointToml::parse(content).is_err());
    }

    #[test]
    fn test_waypoint_toml_claude_cmd_priority() {
        let _guard = ENV_MUTEX.lock().unwrap();

        let saved = std::env::var("CLAUDE_CMD").ok();
        unsafe { std::env::remove_var("CLAUDE_CMD") };

        let toml = WaypointToml::default();
        assert_eq!(toml.claude_cmd(), "claude");

        let toml = WaypointToml::parse("[project]\nclaude_cmd = \"file-claude\"\n").unwrap();
        assert_eq!(toml.claude_cmd(), "file-claude");

        if let Some(val) = saved {
            unsafe { std::env::set_var("CLAUDE_CMD", val) };
        }
    }

    #[test]
    fn test_waypoint_toml_autonomy_env_override() {
        let _guard = ENV_MUTEX.lock().unwrap();

        let saved = std::env::var("WAYPOINT_AUTONOMY").ok();
        unsafe { std::env::set_var("WAYPOINT_AUTONOMY", "auto-approve") };
        assert_eq!(WaypointToml::default().autonomy(), AutonomyMode::AutoApprove);

        unsafe { std::env::set_var("WAYPOINT_AUTONOMY", "bogus") };
        assert_eq!(WaypointToml::default().autonomy(), AutonomyMode::Interactive);

        unsafe { std::env::remove_var("WAYPOINT_AUTONOMY") };
        if let Some(val) = saved {
            unsafe { std::env::set_var("WAYPOINT_AUTONOMY", val) };
        }
    }

    #[test]
    fn test_waypoint_toml_validate() {
        assert!(WaypointToml::default().validate().is_empty());

        let content = r#"
[defaults]
max_restarts = 0
steps = ["review", "review"]
"#;
        let warnings = WaypointToml::parse(content).unwrap().validate();
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.contains("'review'")));
        assert!(warnings.iter().any(|w| w.contains("max_restarts")));

        let empty = WaypointToml::parse("[defaults]\nsteps = []\n").unwrap();
        assert_eq!(empty.validate().len(), 1);
    }

    #[test]
    fn test_waypoint_toml_load_and_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("waypoint.toml");

        let mut toml = WaypointToml::default();
        toml.project.name = Some("saved".into());
        toml.defaults.max_restarts = Some(5);
        toml.save(&path).unwrap();

        let loaded = WaypointToml::load(&path).unwrap();
        assert_eq!(loaded.project.name.as_deref(), Some("saved"));
        assert_eq!(loaded.defaults.max_restarts, Some(5));
        assert_eq!(loaded.defaults.steps, StepKind::ALL.to_vec());
    }

    #[test]
    fn test_waypoint_toml_load_or_default_missing_file() {
        let dir = tempdir().unwrap();
        let toml = WaypointToml::load_or_default(dir.path()).unwrap();
        assert!(toml.project.claude_cmd.is_none());
    }

    #[test]
    fn test_config_paths() {
        let dir = tempdir().unwrap();
        let config = Config::new(dir.path().to_path_buf(), false, false).unwrap();

        // Use ends_with to handle symlink resolution differences on macOS
        assert!(config.waypoint_dir.ends_with(".waypoint"));
        assert!(config.log_dir.ends_with(".waypoint/logs"));
        assert!(config.config_path().ends_with(".waypoint/waypoint.toml"));
    }

    #[test]
    fn test_config_cli_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let dir = tempdir().unwrap();
        let waypoint_dir = dir.path().join(WAYPOINT_DIR);
        std::fs::create_dir_all(&waypoint_dir).unwrap();
        std::fs::write(
            waypoint_dir.join("waypoint.toml"),
            "[defaults]\nmax_restarts = 4\nautonomy = \"interactive\"\n",
        )
        .unwrap();

        let saved = std::env::var("WAYPOINT_AUTONOMY").ok();
        unsafe { std::env::remove_var("WAYPOINT_AUTONOMY") };

        let config = Config::new(dir.path().to_path_buf(), false, false).unwrap();
        assert_eq!(config.max_restarts(), Some(4));
        assert_eq!(config.autonomy(), AutonomyMode::Interactive);

        let config = Config::new(dir.path().to_path_buf(), true, true)
            .unwrap()
            .with_max_restarts(Some(1));
        assert_eq!(config.max_restarts(), Some(1));
        assert_eq!(config.autonomy(), AutonomyMode::AutoApprove);
        assert!(config.verbose);

        if let Some(val) = saved {
            unsafe { std::env::set_var("WAYPOINT_AUTONOMY", val) };
        }
    }

    #[test]
    fn test_config_claude_flags() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = std::env::var("SKIP_PERMISSIONS").ok();
        unsafe { std::env::remove_var("SKIP_PERMISSIONS") };

        let dir = tempdir().unwrap();
        let mut config = Config::new(dir.path().to_path_buf(), false, false).unwrap();
        config.toml.claude.extra_flags = vec!["--model".into(), "opus".into()];
        let flags = config.claude_flags();

        assert!(flags.contains(&"--dangerously-skip-permissions".to_string()));
        assert!(flags.contains(&"--print".to_string()));
        assert!(flags.contains(&"stream-json".to_string()));
        assert_eq!(flags[flags.len() - 2..], ["--model", "opus"]);

        if let Some(val) = saved {
            unsafe { std::env::set_var("SKIP_PERMISSIONS", val) };
        }
    }

    #[test]
    fn test_ensure_directories() {
        let dir = tempdir().unwrap();
        let config = Config::new(dir.path().to_path_buf(), false, false).unwrap();
        config.ensure_directories().unwrap();
        assert!(config.log_dir.exists());
    }
}
