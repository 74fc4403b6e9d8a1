//! Supervised process domain types.
//!
//! These are pure data types shared by the runtime engine and its adapters.
//! They contain no OS handles: the runtime owns the child process, and
//! everything here is a value that can be cloned out as a snapshot.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ports::SupervisorError;
use crate::utils::split_arguments;

/// Immutable description of a program to supervise.
///
/// Created once (from configuration or an interactive command) and never
/// mutated afterwards; restarts reuse the same spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSpec {
    /// Logical name, unique within a registry.
    pub name: String,
    /// Program to launch.
    pub executable_path: PathBuf,
    /// Argument string, split with shell quoting rules before spawning.
    #[serde(default)]
    pub arguments: String,
    /// Working directory for the child (created if absent).
    #[serde(default)]
    pub working_directory: Option<PathBuf>,
    /// Restart automatically after an unexpected exit.
    #[serde(default)]
    pub auto_restart: bool,
}

impl ProcessSpec {
    /// Create a spec with no arguments, inherited working directory and
    /// auto-restart disabled.
    pub fn new(name: impl Into<String>, executable_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            executable_path: executable_path.into(),
            arguments: String::new(),
            working_directory: None,
            auto_restart: false,
        }
    }

    /// Set the argument string.
    #[must_use]
    pub fn with_arguments(mut self, arguments: impl Into<String>) -> Self {
        self.arguments = arguments.into();
        self
    }

    /// Set the working directory. An empty path means "inherit".
    #[must_use]
    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.working_directory = if dir.as_os_str().is_empty() {
            None
        } else {
            Some(dir)
        };
        self
    }

    /// Enable or disable auto-restart.
    #[must_use]
    pub const fn with_auto_restart(mut self, auto_restart: bool) -> Self {
        self.auto_restart = auto_restart;
        self
    }

    /// Split the argument string into an argv tail.
    pub fn argv(&self) -> Result<Vec<String>, SupervisorError> {
        split_arguments(&self.arguments).map_err(|e| {
            SupervisorError::InvalidSpec(format!("{}: bad argument string: {e}", self.name))
        })
    }

    /// Check the invariants a registry relies on.
    pub fn validate(&self) -> Result<(), SupervisorError> {
        if self.name.trim().is_empty() {
            return Err(SupervisorError::InvalidSpec(
                "process name cannot be empty".to_string(),
            ));
        }
        if self.executable_path.as_os_str().is_empty() {
            return Err(SupervisorError::InvalidSpec(format!(
                "{}: executable path cannot be empty",
                self.name
            )));
        }
        self.argv().map(|_| ())
    }
}

/// Lifecycle state of a supervised process.
///
/// `Starting → Running → Stopping → Stopped`, with `Running → Failed` on an
/// unexpected exit. `Stopped` and `Failed` end one OS process instance; a
/// restart moves the same logical record back to `Starting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessState {
    /// A launch has been requested but the child is not confirmed yet.
    Starting,
    /// The child is alive and being monitored.
    Running,
    /// A deliberate stop is in progress.
    Stopping,
    /// The child was stopped on request (or never launched).
    Stopped,
    /// The child exited on its own, or could not be launched.
    Failed,
}

impl ProcessState {
    /// Whether an OS process may exist in this state.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Stopping)
    }

    /// Whether this state ends an OS process instance.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }

    /// Lowercase label used in logs and the console.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which stream a captured log line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    /// Child standard output.
    Stdout,
    /// Child standard error.
    Stderr,
    /// Supervisor-generated lines (start, exit, stop).
    System,
}

impl OutputStream {
    /// Three-letter tag written in front of each log line.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Stdout => "OUT",
            Self::Stderr => "ERR",
            Self::System => "SYS",
        }
    }
}

/// Point-in-time snapshot of a supervised process.
///
/// Owned exclusively by its supervised process; callers only ever receive
/// clones. `pid` and `started_at` are set only while the state is
/// `Running` or `Stopping`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecord {
    pub name: String,
    pub state: ProcessState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Cumulative CPU time of the current instance.
    pub cpu_time_ms: u64,
    /// Resident memory of the current instance.
    pub memory_bytes: u64,
    pub executable_path: PathBuf,
    pub arguments: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<PathBuf>,
    pub auto_restart: bool,
    /// Number of launch attempts so far, including the first.
    pub launches: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_exit_code: Option<i32>,
    /// Log file of the current (or most recent) run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// Unix timestamp in milliseconds of the last mutation.
    pub updated_at: u64,
}

impl ProcessRecord {
    /// Fresh record for a spec, in `Starting` with no OS process yet.
    pub fn new(spec: &ProcessSpec) -> Self {
        Self {
            name: spec.name.clone(),
            state: ProcessState::Starting,
            pid: None,
            started_at: None,
            cpu_time_ms: 0,
            memory_bytes: 0,
            executable_path: spec.executable_path.clone(),
            arguments: spec.arguments.clone(),
            working_directory: spec.working_directory.clone(),
            auto_restart: spec.auto_restart,
            launches: 0,
            last_exit_code: None,
            log_file: None,
            updated_at: now_ms(),
        }
    }

    /// Number of launches after the first one.
    pub const fn restart_count(&self) -> u32 {
        self.launches.saturating_sub(1)
    }

    /// A launch attempt begins.
    pub fn mark_starting(&mut self, log_file: Option<PathBuf>) {
        self.state = ProcessState::Starting;
        self.launches = self.launches.saturating_add(1);
        self.log_file = log_file;
        self.clear_instance();
    }

    /// The child was spawned.
    pub fn mark_running(&mut self, pid: Option<u32>, started_at: DateTime<Utc>) {
        self.state = ProcessState::Running;
        self.pid = pid;
        self.started_at = Some(started_at);
        self.last_exit_code = None;
        self.touch();
    }

    /// A deliberate stop began.
    pub fn mark_stopping(&mut self) {
        self.state = ProcessState::Stopping;
        self.touch();
    }

    /// The child is gone after a deliberate stop.
    pub fn mark_stopped(&mut self, exit_code: Option<i32>) {
        self.state = ProcessState::Stopped;
        if exit_code.is_some() {
            self.last_exit_code = exit_code;
        }
        self.clear_instance();
    }

    /// The child exited on its own or never launched.
    pub fn mark_failed(&mut self, exit_code: Option<i32>) {
        self.state = ProcessState::Failed;
        self.last_exit_code = exit_code;
        self.clear_instance();
    }

    /// Store a resource sample. CPU time never decreases within one run.
    pub fn record_usage(&mut self, cpu_time_ms: u64, memory_bytes: u64) {
        self.cpu_time_ms = self.cpu_time_ms.max(cpu_time_ms);
        self.memory_bytes = memory_bytes;
        self.touch();
    }

    fn clear_instance(&mut self) {
        self.pid = None;
        self.started_at = None;
        self.cpu_time_ms = 0;
        self.memory_bytes = 0;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = now_ms();
    }
}

fn now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ProcessSpec {
        ProcessSpec::new("web", "/usr/bin/web")
            .with_arguments("--port 8080 \"two words\"")
            .with_working_directory("/srv/web")
    }

    #[test]
    fn test_argv_respects_quotes() {
        let argv = spec().argv().unwrap();
        assert_eq!(argv, vec!["--port", "8080", "two words"]);
    }

    #[test]
    fn test_empty_working_directory_means_inherit() {
        let spec = ProcessSpec::new("a", "b").with_working_directory("");
        assert!(spec.working_directory.is_none());
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let err = ProcessSpec::new("  ", "/bin/true").validate().unwrap_err();
        assert!(matches!(err, SupervisorError::InvalidSpec(_)));
    }

    #[test]
    fn test_validate_rejects_unbalanced_quotes() {
        let spec = ProcessSpec::new("a", "/bin/true").with_arguments("\"open");
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_record_lifecycle_clears_instance_fields() {
        let mut record = ProcessRecord::new(&spec());
        assert_eq!(record.state, ProcessState::Starting);
        assert_eq!(record.launches, 0);

        record.mark_starting(Some(PathBuf::from("/tmp/web.log")));
        record.mark_running(Some(42), Utc::now());
        record.record_usage(150, 4096);
        assert_eq!(record.pid, Some(42));
        assert!(record.started_at.is_some());

        record.mark_failed(Some(3));
        assert_eq!(record.state, ProcessState::Failed);
        assert_eq!(record.pid, None);
        assert_eq!(record.started_at, None);
        assert_eq!(record.last_exit_code, Some(3));
        assert_eq!(record.log_file, Some(PathBuf::from("/tmp/web.log")));
    }

    #[test]
    fn test_cpu_time_is_monotonic_within_a_run() {
        let mut record = ProcessRecord::new(&spec());
        record.record_usage(500, 10);
        record.record_usage(200, 20);
        assert_eq!(record.cpu_time_ms, 500);
        assert_eq!(record.memory_bytes, 20);
    }

    #[test]
    fn test_restart_count() {
        let mut record = ProcessRecord::new(&spec());
        assert_eq!(record.restart_count(), 0);
        record.mark_starting(None);
        record.mark_starting(None);
        record.mark_starting(None);
        assert_eq!(record.restart_count(), 2);
    }

    #[test]
    fn test_state_serializes_lowercase() {
        let json = serde_json::to_string(&ProcessState::Failed).unwrap();
        assert_eq!(json, "\"failed\"");
        assert_eq!(OutputStream::Stderr.tag(), "ERR");
    }
}
