//! CLI entry point.
//!
//! Logging and environment are set up here; everything else is wired in
//! `bootstrap` and dispatched to handlers.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use seerd_cli::error::exit_code_for;
use seerd_cli::{Cli, CliConfig, Commands, bootstrap, handlers};

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Run { config } => {
            let ctx = bootstrap(&CliConfig {
                config_path: config,
                require_config: true,
            })?;
            handlers::run::execute(&ctx).await?;
        }
        Commands::Console { config, autostart } => {
            let ctx = bootstrap(&CliConfig {
                config_path: config,
                require_config: false,
            })?;
            handlers::console::execute(&ctx, autostart).await?;
        }
        Commands::Check { config } => {
            handlers::check::execute(&CliConfig {
                config_path: config,
                require_config: true,
            })?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables (SEERD_CONFIG may come from .env)
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        // No command provided - show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    if let Err(e) = dispatch(command).await {
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code_for(&e));
    }
    Ok(())
}
