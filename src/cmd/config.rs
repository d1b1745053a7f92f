//! Configuration view and validation commands: `waypoint config`.

use anyhow::Result;

use super::super::ConfigCommands;

pub fn cmd_config(project_dir: &std::path::Path, command: Option<ConfigCommands>) -> Result<()> {
    use waypoint::config::{Config, WAYPOINT_DIR, WaypointToml};

    let waypoint_dir = project_dir.join(WAYPOINT_DIR);
    let config_path = waypoint_dir.join("waypoint.toml");

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Waypoint Configuration");
            println!("======================");
            println!();

            let toml = if config_path.exists() {
                println!("Config file: {}", config_path.display());
                WaypointToml::load(&config_path)?
            } else {
                println!("No waypoint.toml found at {}", config_path.display());
                println!("Using default configuration.");
                WaypointToml::default()
            };
            println!();

            if toml.project.name.is_some() || toml.project.claude_cmd.is_some() {
                println!("[project]");
                if let Some(name) = &toml.project.name {
                    println!("  name = \"{}\"", name);
                }
                if let Some(cmd) = &toml.project.claude_cmd {
                    println!("  claude_cmd = \"{}\"", cmd);
                }
                println!();
            }

            let steps: Vec<String> = toml
                .defaults
                .steps
                .iter()
                .map(|s| format!("\"{}\"", s))
                .collect();
            println!("[defaults]");
            println!("  autonomy = \"{}\"", toml.defaults.autonomy);
            println!("  skip_permissions = {}", toml.defaults.skip_permissions);
            match toml.defaults.max_restarts {
                Some(limit) => println!("  max_restarts = {}", limit),
                None => println!("  max_restarts = (unbounded)"),
            }
            println!("  steps = [{}]", steps.join(", "));
            println!();

            if !toml.claude.extra_flags.is_empty() {
                println!("[claude]");
                println!("  extra_flags = {:?}", toml.claude.extra_flags);
                println!();
            }

            if project_dir.exists() {
                println!("Effective values (with env overrides):");
                let config = Config::new(project_dir.to_path_buf(), false, false)?;
                println!("  claude_cmd = \"{}\"", config.claude_cmd());
                println!("  skip_permissions = {}", config.skip_permissions());
                println!("  autonomy = \"{}\"", config.autonomy());
                println!();
            }

            if !config_path.exists() {
                println!("Run 'waypoint config init' to create a waypoint.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No waypoint.toml found. Using defaults (valid).");
                return Ok(());
            }

            let toml = WaypointToml::load(&config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("waypoint.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if !waypoint_dir.exists() {
                std::fs::create_dir_all(&waypoint_dir)?;
            }

            let toml = WaypointToml::default();
            toml.save(&config_path)?;

            println!("Created waypoint.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [project] name, claude_cmd");
            println!("  - [defaults] autonomy, skip_permissions, max_restarts, steps");
            println!("  - [claude] extra_flags");
            println!();
        }
    }

    Ok(())
}
