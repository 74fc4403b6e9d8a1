//! Run command handler: service mode.
//!
//! Starts every configured app, logs status transitions, and supervises
//! until Ctrl-C, then stops everything.

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::bootstrap::CliContext;

/// Execute the run command.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let specs = ctx.apps.specs();
    if specs.is_empty() {
        warn!(path = %ctx.config_path.display(), "No apps configured");
    }

    let transitions = ctx.registry().on_status_changed(|record| {
        info!(
            name = %record.name,
            state = %record.state,
            pid = ?record.pid,
            exit_code = ?record.last_exit_code,
            "Status changed"
        );
    });

    let total = specs.len();
    let failures = ctx.registry().start_all(specs).await;
    for (name, e) in &failures {
        error!(name = %name, error = %e, "App failed to start");
    }
    info!(
        started = total - failures.len(),
        failed = failures.len(),
        "Supervisor running, press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    info!("Shutdown requested");
    ctx.registry().shutdown().await;
    transitions.abort();
    Ok(())
}
