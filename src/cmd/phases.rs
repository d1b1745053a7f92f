//! Plan listing command: `waypoint phases`.

use anyhow::Result;
use console::style;
use std::path::Path;

use waypoint::plan::{PhaseSource, PlanDir};

use super::resolve_path;

pub fn cmd_phases(project_dir: &Path, plan: &Path) -> Result<()> {
    let plan_path = resolve_path(project_dir, plan);
    let phases = PlanDir::new(&plan_path).phases()?;

    println!();
    println!("{} ({} phases)", style(plan_path.display()).bold(), phases.len());
    println!();
    for phase in &phases {
        let number = phase
            .number
            .map(|n| format!("{:>3}", n))
            .unwrap_or_else(|| "  -".to_string());
        println!(
            "  {}  {}  {}",
            style(number).dim(),
            style(&phase.label).yellow(),
            style(&phase.file_name).dim()
        );
    }
    println!();

    Ok(())
}
