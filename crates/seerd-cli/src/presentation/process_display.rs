//! Rendering of process records for the console and service logs.

use chrono::{DateTime, Utc};
use seerd_core::ProcessRecord;

use super::tables::{format_optional, truncate_string};

/// Memory in MiB with one decimal.
#[allow(clippy::cast_precision_loss)]
pub fn format_memory(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
}

/// CPU time in seconds with two decimals.
#[allow(clippy::cast_precision_loss)]
pub fn format_cpu_time(ms: u64) -> String {
    format!("{:.2}s", ms as f64 / 1000.0)
}

/// Compact uptime such as `3h05m`, `4m12s` or `9s`.
pub fn format_uptime(started_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - started_at).num_seconds().max(0);
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h{m:02}m")
    } else if m > 0 {
        format!("{m}m{s:02}s")
    } else {
        format!("{s}s")
    }
}

/// Column header matching [`process_row`].
pub fn process_table_header() -> String {
    format!(
        "{:<20} {:<9} {:<8} {:<10} {:<10} {:<9} Restarts",
        "Name", "State", "PID", "CPU", "Memory", "Uptime"
    )
}

/// One table row for `list`.
pub fn process_row(record: &ProcessRecord, now: DateTime<Utc>) -> String {
    let uptime = record
        .started_at
        .map_or_else(|| "--".to_string(), |at| format_uptime(at, now));
    format!(
        "{:<20} {:<9} {:<8} {:<10} {:<10} {:<9} {}",
        truncate_string(&record.name, 20),
        record.state,
        format_optional(record.pid.as_ref(), "--"),
        format_cpu_time(record.cpu_time_ms),
        format_memory(record.memory_bytes),
        uptime,
        record.restart_count()
    )
}

/// Labelled fields for `info`.
pub fn process_details(record: &ProcessRecord) -> Vec<(&'static str, String)> {
    vec![
        ("Name", record.name.clone()),
        ("State", record.state.to_string()),
        ("Process ID", format_optional(record.pid.as_ref(), "--")),
        ("Executable", record.executable_path.display().to_string()),
        ("Arguments", record.arguments.clone()),
        (
            "Working Directory",
            record
                .working_directory
                .as_ref()
                .map_or_else(|| "(inherited)".to_string(), |d| d.display().to_string()),
        ),
        (
            "Start Time",
            record.started_at.map_or_else(
                || "--".to_string(),
                |at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            ),
        ),
        ("CPU Time", format_cpu_time(record.cpu_time_ms)),
        ("Memory", format_memory(record.memory_bytes)),
        ("Auto Restart", record.auto_restart.to_string()),
        ("Restarts", record.restart_count().to_string()),
        (
            "Last Exit Code",
            format_optional(record.last_exit_code.as_ref(), "--"),
        ),
        (
            "Log File",
            record
                .log_file
                .as_ref()
                .map_or_else(|| "--".to_string(), |p| p.display().to_string()),
        ),
    ]
}
