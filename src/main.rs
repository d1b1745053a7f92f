use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use waypoint::logging::{self, LogFormat};

mod cmd;

#[derive(Parser)]
#[command(name = "waypoint")]
#[command(version, about = "Checkpointed research, planning and review of plan phases")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Auto-approve every checkpoint
    #[arg(long, global = true)]
    pub yes: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Log output format on stderr
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the review steps against one or all phases of a plan
    Review(cmd::review::ReviewArgs),
    /// List the phases of a plan in execution order
    Phases {
        /// Plan directory or single phase file
        #[arg(long)]
        plan: PathBuf,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default waypoint.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_format);

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Review(args) => {
            let success = cmd::cmd_review(&cli, project_dir, args).await?;
            if !success {
                std::process::exit(1);
            }
        }
        Commands::Phases { plan } => cmd::cmd_phases(&project_dir, plan)?,
        Commands::Config { command } => cmd::cmd_config(&project_dir, command.clone())?,
    }

    Ok(())
}
