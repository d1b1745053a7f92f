use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

use super::{AssistantTool, ToolOutput, ToolRequest};
use crate::config::Config;
use crate::errors::ToolError;
use crate::stream::OutputCollector;
use crate::ui::ReviewUI;

/// Runs steps through the Claude CLI in `--print` mode.
pub struct ClaudeCli {
    command: String,
    flags: Vec<String>,
    working_dir: PathBuf,
    log_dir: Option<PathBuf>,
    ui: Option<Arc<ReviewUI>>,
}

impl ClaudeCli {
    pub fn new(command: impl Into<String>, flags: Vec<String>, working_dir: PathBuf) -> Self {
        Self {
            command: command.into(),
            flags,
            working_dir,
            log_dir: None,
            ui: None,
        }
    }

    /// Build from runtime configuration, logging prompts and outputs under `.waypoint/logs`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.claude_cmd(),
            config.claude_flags(),
            config.project_dir.clone(),
        )
        .with_log_dir(config.log_dir.clone())
    }

    pub fn with_log_dir(mut self, log_dir: PathBuf) -> Self {
        self.log_dir = Some(log_dir);
        self
    }

    pub fn with_ui(mut self, ui: Arc<ReviewUI>) -> Self {
        self.ui = Some(ui);
        self
    }

    fn log_file(&self, request: &ToolRequest, kind: &str) -> Option<PathBuf> {
        let stem = Path::new(&request.phase_file)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("phase");
        self.log_dir.as_ref().map(|dir| {
            dir.join(format!(
                "{}-{}-attempt-{}-{}",
                stem, request.step, request.attempt, kind
            ))
        })
    }

    fn write_log(path: Option<PathBuf>, content: &str) -> Result<(), ToolError> {
        if let Some(path) = path {
            std::fs::write(&path, content)
                .map_err(|source| ToolError::LogWriteFailed { path, source })?;
        }
        Ok(())
    }
}

#[async_trait]
impl AssistantTool for ClaudeCli {
    async fn invoke(&self, request: &ToolRequest) -> Result<ToolOutput, ToolError> {
        Self::write_log(self.log_file(request, "prompt.md"), &request.prompt)?;

        tracing::debug!(
            command = %self.command,
            flags = ?self.flags,
            prompt_chars = request.prompt.len(),
            "spawning assistant"
        );

        let start = Instant::now();
        let mut child = Command::new(&self.command)
            .args(&self.flags)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .current_dir(&self.working_dir)
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolError::SpawnFailed {
                command: self.command.clone(),
                source,
            })?;

        // Feed the prompt while stdout is read; a process that exits without
        // reading stdin must not hide its stderr behind a broken pipe
        let stdin_task = child.stdin.take().map(|mut stdin| {
            let prompt = request.prompt.clone();
            tokio::spawn(async move {
                stdin.write_all(prompt.as_bytes()).await?;
                stdin.shutdown().await?;
                Ok::<(), std::io::Error>(())
            })
        });

        // Drain stderr concurrently so a chatty process cannot block on a full pipe
        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let _ = stderr.read_to_end(&mut buf).await;
                String::from_utf8_lossy(&buf).into_owned()
            })
        });

        let mut collector = OutputCollector::new();
        if let Some(stdout) = child.stdout.take() {
            let mut reader = BufReader::new(stdout);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                if reader.read_until(b'\n', &mut buf).await? == 0 {
                    break;
                }
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']);
                if let Some(activity) = collector.push_line(line)
                    && let Some(ui) = &self.ui
                {
                    ui.show_activity(&activity);
                }
            }
        }

        let status = child.wait().await?;
        if let Some(task) = stdin_task
            && let Ok(Err(e)) = task.await
        {
            if e.kind() == std::io::ErrorKind::BrokenPipe {
                tracing::debug!("assistant closed stdin before reading the whole prompt");
            } else {
                return Err(ToolError::Io(e));
            }
        }
        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        let (text, stream_error) = collector.finish();
        Self::write_log(self.log_file(request, "output.log"), &text)?;

        tracing::debug!(
            exit_code = ?status.code(),
            elapsed_secs = start.elapsed().as_secs_f64(),
            output_chars = text.len(),
            "assistant finished"
        );

        if status.success() && !stream_error {
            return Ok(ToolOutput::success(text));
        }

        let stderr = stderr.trim();
        let diagnostic = if !stderr.is_empty() {
            Some(stderr.to_string())
        } else if stream_error {
            Some("assistant reported an error result".to_string())
        } else {
            // Killed by a signal leaves no exit code and, usually, nothing on stderr
            status
                .code()
                .map(|code| format!("assistant exited with code {}", code))
        };
        Ok(ToolOutput::failure(text, diagnostic))
    }
}
