//! Review command: `waypoint review`.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;
use std::sync::Arc;

use waypoint::config::Config;
use waypoint::orchestrator::{ReviewConfig, ReviewOrchestrator, ReviewResult};
use waypoint::tool::ClaudeCli;
use waypoint::ui::ReviewUI;

use super::super::Cli;
use super::resolve_path;

#[derive(Args, Debug, Clone)]
pub struct ReviewArgs {
    /// Plan directory or single phase file
    #[arg(long)]
    pub plan: PathBuf,

    /// Phase to review (number, file name or label)
    #[arg(short, long)]
    pub phase: Option<String>,

    /// Run only this step: research, planning or review
    #[arg(short, long)]
    pub step: Option<String>,

    /// Review every phase in plan order
    #[arg(long)]
    pub all: bool,

    /// Write the Markdown report to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Initial context passed to the first step
    #[arg(long)]
    pub context: Option<String>,

    /// Maximum restarts of a single step. Overrides waypoint.toml.
    #[arg(long)]
    pub max_restarts: Option<u32>,

    /// Print the result as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Run a review. Returns whether the run succeeded.
pub async fn cmd_review(cli: &Cli, project_dir: PathBuf, args: &ReviewArgs) -> Result<bool> {
    let config = Config::new(project_dir, cli.verbose, cli.yes)?
        .with_max_restarts(args.max_restarts);
    config.ensure_directories()?;

    let review_config = ReviewConfig {
        project_path: config.project_dir.clone(),
        plan_path: resolve_path(&config.project_dir, &args.plan),
        phase: args.phase.clone(),
        step: args.step.clone(),
        output_path: args
            .output
            .as_ref()
            .map(|p| resolve_path(&config.project_dir, p)),
        autonomy: config.autonomy(),
        all_phases: args.all,
        initial_context: args.context.clone().unwrap_or_default(),
        max_restarts: config.max_restarts(),
    };

    let mut tool = ClaudeCli::from_config(&config);
    let mut orchestrator_ui = None;
    if !args.json {
        let ui = Arc::new(ReviewUI::new(0, cli.verbose));
        tool = tool.with_ui(Arc::clone(&ui));
        orchestrator_ui = Some(ui);
    }

    let mut orchestrator =
        ReviewOrchestrator::new(Arc::new(tool)).with_steps(config.steps().to_vec());
    if let Some(ui) = orchestrator_ui {
        orchestrator = orchestrator.with_ui(ui);
    }

    let result = orchestrator.run(review_config.clone()).await;

    if args.json {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
        println!("{}", json);
    } else {
        print_summary(&review_config, &result);
    }

    Ok(result.success)
}

fn print_summary(config: &ReviewConfig, result: &ReviewResult) {
    println!();
    if result.success {
        if result.exited {
            println!("{}", style("Review stopped at checkpoint.").yellow().bold());
        } else {
            println!("{}", style("Review complete.").green().bold());
        }
    } else {
        println!("{}", style("Review failed.").red().bold());
        if !result.failed_at.is_empty() {
            println!("  Failed at: {}", style(&result.failed_at).yellow());
        }
        if result.error.is_empty() {
            println!("  No diagnostic was reported.");
        } else {
            println!("  Error: {}", result.error);
        }
    }

    if !result.issues.is_empty() {
        println!("  Issues: {}", result.issues.join(", "));
    }
    println!("  Steps run: {}", result.steps_run);
    if result.success
        && let Some(path) = &config.output_path
    {
        println!("  Report: {}", path.display());
    }
    println!();
}
