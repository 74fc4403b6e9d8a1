//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure with global options.

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface definition for the seerd process supervisor.
///
/// This is the top-level parser that handles global options and dispatches
/// to subcommands.
#[derive(Parser)]
#[command(name = "seerd")]
#[command(about = "Launch, monitor and restart configured programs")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::path::PathBuf;

    #[test]
    fn test_cli_parser_builds() {
        // Verify the CLI parser can be constructed
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from(["seerd", "--verbose", "check", "--config", "/tmp/apps.json"]);
        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Check { config }) => {
                assert_eq!(config, Some(PathBuf::from("/tmp/apps.json")));
            }
            _ => panic!("expected check command"),
        }
    }

    #[test]
    fn test_console_autostart_flag() {
        let cli = Cli::parse_from(["seerd", "console", "--autostart"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Console {
                autostart: true,
                config: None
            })
        ));
    }
}
