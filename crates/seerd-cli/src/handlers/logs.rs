//! Logs command handler.
//!
//! Tails the captured output file of the process's current (or last) run.

use anyhow::Result;
use seerd_core::ProcessSupervisor;
use seerd_runtime::tail_log;

use crate::error::CliError;

/// Print the last `lines` lines of a process's run log.
pub async fn execute(supervisor: &dyn ProcessSupervisor, name: &str, lines: usize) -> Result<()> {
    let Some(record) = supervisor.get_info(name) else {
        println!("Process {name} not found");
        return Ok(());
    };
    let Some(path) = record.log_file else {
        println!("Process {name} has no log file yet");
        return Ok(());
    };

    let tail = tail_log(&path, lines)
        .await
        .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;

    println!("--- {} (last {} lines) ---", path.display(), tail.len());
    for line in tail {
        println!("{line}");
    }
    Ok(())
}
