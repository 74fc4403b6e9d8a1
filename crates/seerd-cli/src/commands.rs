//! Subcommands of the `seerd` binary.

use std::path::PathBuf;

use clap::Subcommand;
use seerd_core::config::CONFIG_ENV_VAR;

/// Available commands.
///
/// Every command that reads the app list accepts `--config`; without it the
/// file is looked up through `SEERD_CONFIG`, next to the executable, then in
/// the current directory.
#[derive(Subcommand)]
pub enum Commands {
    /// Start every configured app and supervise until Ctrl-C
    Run {
        /// Path to the apps configuration file
        #[arg(short, long, env = CONFIG_ENV_VAR)]
        config: Option<PathBuf>,
    },

    /// Open an interactive console to start, stop and inspect processes
    Console {
        /// Path to the apps configuration file
        #[arg(short, long, env = CONFIG_ENV_VAR)]
        config: Option<PathBuf>,
        /// Start every configured app before showing the prompt
        #[arg(long)]
        autostart: bool,
    },

    /// Validate the configuration file and print the resolved apps
    Check {
        /// Path to the apps configuration file
        #[arg(short, long, env = CONFIG_ENV_VAR)]
        config: Option<PathBuf>,
    },
}
