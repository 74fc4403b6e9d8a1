//! Check command handler.
//!
//! Validates the configuration file and prints the apps it resolves to.

use anyhow::Result;
use seerd_core::AppsConfig;

use crate::bootstrap::{CliConfig, load_apps};
use crate::presentation::{print_separator, truncate_string};

/// Execute the check command. Fails if the file is missing or invalid.
pub fn execute(config: &CliConfig) -> Result<()> {
    let config = CliConfig {
        require_config: true,
        ..config.clone()
    };
    let (path, apps) = load_apps(&config)?;

    println!("Configuration OK: {}", path.display());
    print_apps(&apps);
    Ok(())
}

fn print_apps(apps: &AppsConfig) {
    let settings = &apps.supervisor;
    println!(
        "Poll interval: {}ms, restart delay: {}ms",
        settings.effective_poll_interval().as_millis(),
        settings.effective_restart_delay().as_millis()
    );
    if let Some(dir) = &settings.log_directory {
        println!("Log directory: {}", dir.display());
    }
    println!();

    if apps.apps.is_empty() {
        println!("No apps configured.");
        return;
    }

    println!(
        "{:<20} {:<8} {:<30} {:<20} Working Directory",
        "Name", "Restart", "Executable", "Arguments"
    );
    print_separator(100);

    for spec in apps.specs() {
        println!(
            "{:<20} {:<8} {:<30} {:<20} {}",
            truncate_string(&spec.name, 20),
            if spec.auto_restart { "auto" } else { "manual" },
            truncate_string(&spec.executable_path.display().to_string(), 30),
            truncate_string(&spec.arguments, 20),
            spec.working_directory
                .as_ref()
                .map_or_else(|| "(inherited)".to_string(), |d| d.display().to_string())
        );
    }
}
