//! One supervised child process.
//!
//! `SupervisedProcess` owns the child's stdin, the log of the current run and
//! the monitor handle (which in turn owns the `Child`). Its record lives in a
//! shared [`StatusCell`] so the registry can answer queries without taking
//! the per-process lock.
//!
//! Lifecycle methods take `&mut self`; the registry serializes them per name.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, Utc};
use seerd_core::{
    OutputStream, ProcessRecord, ProcessSpec, ProcessState, SupervisorError, SupervisorSettings,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::broadcaster::StatusBroadcaster;
use super::command;
use super::logs::RunLog;
use super::monitor::{MonitorContext, MonitorHandle, RestartRequest};
use super::shutdown::{kill_process_group, terminate_tree};
use super::status::StatusCell;
use super::stdin::{SendRejected, StdinWriter};
use super::stream::spawn_stream_reader;

/// Engine settings shared by every supervised process of a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorOptions {
    /// Interval between liveness/resource polls.
    pub poll_interval: Duration,
    /// Directory for run logs. `None` means the process's working directory.
    pub log_directory: Option<PathBuf>,
    /// Delay before an auto-restart spawns again.
    pub restart_delay: Duration,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            log_directory: None,
            restart_delay: Duration::ZERO,
        }
    }
}

impl From<&SupervisorSettings> for SupervisorOptions {
    fn from(settings: &SupervisorSettings) -> Self {
        Self {
            poll_interval: settings.effective_poll_interval(),
            log_directory: settings.log_directory.clone(),
            restart_delay: settings.effective_restart_delay(),
        }
    }
}

pub struct SupervisedProcess {
    spec: ProcessSpec,
    options: SupervisorOptions,
    status: Arc<StatusCell>,
    stdin: Option<StdinWriter>,
    log: Option<RunLog>,
    monitor: Option<MonitorHandle>,
    /// Group of the current run. Outlives the leader so that descendants of
    /// a child that exited on its own can still be killed.
    process_group: Option<u32>,
    restarts: Option<mpsc::UnboundedSender<RestartRequest>>,
}

impl SupervisedProcess {
    /// Create a never-started process in `Starting`.
    ///
    /// `restarts` is where the monitor sends auto-restart requests; it is
    /// only used when the spec enables auto-restart.
    pub fn new(
        spec: ProcessSpec,
        options: SupervisorOptions,
        events: Arc<StatusBroadcaster>,
        restarts: Option<mpsc::UnboundedSender<RestartRequest>>,
    ) -> Self {
        let status = Arc::new(StatusCell::new(ProcessRecord::new(&spec), events));
        Self {
            spec,
            options,
            status,
            stdin: None,
            log: None,
            monitor: None,
            process_group: None,
            restarts,
        }
    }

    pub fn spec(&self) -> &ProcessSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn snapshot(&self) -> ProcessRecord {
        self.status.snapshot()
    }

    pub fn state(&self) -> ProcessState {
        self.status.state()
    }

    pub fn watch(&self) -> watch::Receiver<ProcessRecord> {
        self.status.watch()
    }

    pub fn status_cell(&self) -> Arc<StatusCell> {
        Arc::clone(&self.status)
    }

    /// Launch the child and begin monitoring it.
    ///
    /// Valid from the initial state, `Stopped` and `Failed`. Any failure
    /// after validation leaves the record in `Failed` with the attempt
    /// counted in `launches`.
    pub async fn start(&mut self) -> Result<(), SupervisorError> {
        let state = self.status.state();
        if state.is_active() {
            return Err(SupervisorError::InvalidTransition {
                name: self.spec.name.clone(),
                action: "start",
                state,
            });
        }

        // A previous run that ended on its own may still hold handles
        self.release_handles().await;

        if let Some(dir) = &self.spec.working_directory {
            if let Err(e) = tokio::fs::create_dir_all(dir).await {
                return Err(self.fail_before_spawn(format!(
                    "cannot create working directory {}: {e}",
                    dir.display()
                )));
            }
        }

        let log = match RunLog::create(&self.log_directory(), &self.spec.name, Local::now()).await
        {
            Ok(log) => log,
            Err(e) => return Err(self.fail_before_spawn(format!("cannot open run log: {e}"))),
        };

        self.status
            .transition(|record| record.mark_starting(Some(log.path().to_path_buf())));
        log.append(
            OutputStream::System,
            format!(
                "Starting {} {}",
                self.spec.executable_path.display(),
                self.spec.arguments
            ),
        );

        let mut child = match command::spawn(&self.spec) {
            Ok(child) => child,
            Err(e) => {
                log.append(OutputStream::System, format!("Failed to start: {e}"));
                self.status.transition(|record| record.mark_failed(None));
                error!(name = %self.spec.name, error = %e, "Failed to launch process");
                return Err(e);
            }
        };

        if let Some(stdout) = child.stdout.take() {
            spawn_stream_reader(
                stdout,
                self.spec.name.clone(),
                OutputStream::Stdout,
                log.clone(),
            );
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_stream_reader(
                stderr,
                self.spec.name.clone(),
                OutputStream::Stderr,
                log.clone(),
            );
        }
        self.stdin = child
            .stdin
            .take()
            .map(|stdin| StdinWriter::spawn(stdin, self.spec.name.clone()));

        let pid = child.id();
        self.process_group = pid;
        self.status
            .transition(|record| record.mark_running(pid, Utc::now()));
        log.append(
            OutputStream::System,
            match pid {
                Some(pid) => format!("Process started (pid {pid})"),
                None => "Process started".to_string(),
            },
        );
        info!(name = %self.spec.name, pid = ?pid, "Process started");

        let ctx = MonitorContext {
            name: self.spec.name.clone(),
            status: Arc::clone(&self.status),
            log: log.clone(),
            interval: self.options.poll_interval,
            restarts: self
                .restarts
                .clone()
                .filter(|_| self.spec.auto_restart),
        };
        self.monitor = Some(MonitorHandle::spawn(ctx, child));
        self.log = Some(log);
        Ok(())
    }

    /// Stop the child and its descendants, ending in `Stopped`.
    ///
    /// The record leaves `Running` before the monitor is cancelled and the
    /// kill is sent, so the monitor can never report this exit as
    /// unexpected. Kill errors are logged; the record still ends `Stopped`.
    /// A no-op when already stopped.
    pub async fn stop(&mut self) {
        if self.status.state() == ProcessState::Stopped {
            self.release_handles().await;
            return;
        }

        self.status.transition_if(
            |record| !record.state.is_terminal(),
            ProcessRecord::mark_stopping,
        );

        let mut exit_code = None;
        if let Some(monitor) = self.monitor.take() {
            if let Some(child) = monitor.stop().await {
                let pid = child.id();
                match terminate_tree(child).await {
                    Ok(status) => {
                        debug!(name = %self.spec.name, pid = ?pid, %status, "Process terminated");
                        exit_code = status.code();
                    }
                    Err(e) => {
                        warn!(name = %self.spec.name, pid = ?pid, error = %e, "Failed to terminate process");
                        if let Some(log) = &self.log {
                            log.append(OutputStream::System, format!("Failed to kill: {e}"));
                        }
                    }
                }
            }
        }
        self.kill_leftover_group();

        self.stdin = None;
        if let Some(log) = self.log.take() {
            log.append(OutputStream::System, "Process stopped");
        }

        self.status.transition_if(
            |record| record.state != ProcessState::Stopped,
            |record| record.mark_stopped(exit_code),
        );
        info!(name = %self.spec.name, "Process stopped");
    }

    /// `stop()` followed by `start()` with the same spec.
    pub async fn restart(&mut self) -> Result<(), SupervisorError> {
        info!(name = %self.spec.name, "Restarting process");
        self.stop().await;
        self.start().await
    }

    /// Queue `text` plus a line terminator for the child's stdin.
    ///
    /// Never waits on the pipe. Silently dropped unless `Running`; a line
    /// the child has no room for is dropped with a warning.
    pub fn send_command(&self, text: &str) {
        if self.status.state() != ProcessState::Running {
            debug!(name = %self.spec.name, "Dropping command for process that is not running");
            return;
        }
        let Some(stdin) = &self.stdin else {
            return;
        };

        match stdin.try_send(text) {
            Ok(()) => {}
            Err(SendRejected::Full) => {
                warn!(name = %self.spec.name, "Process is not reading stdin, command dropped");
            }
            Err(SendRejected::Closed) => {
                debug!(name = %self.spec.name, "Stdin closed, command dropped");
            }
        }
    }

    fn log_directory(&self) -> PathBuf {
        self.options
            .log_directory
            .clone()
            .or_else(|| self.spec.working_directory.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Record a launch attempt that failed before spawning.
    fn fail_before_spawn(&self, reason: String) -> SupervisorError {
        self.status.transition(|record| {
            record.mark_starting(None);
            record.mark_failed(None);
        });
        error!(name = %self.spec.name, reason = %reason, "Failed to prepare process launch");
        SupervisorError::launch(&self.spec.name, reason)
    }

    /// Kill descendants that outlived the group leader.
    fn kill_leftover_group(&mut self) {
        if let Some(pgid) = self.process_group.take() {
            if let Err(e) = kill_process_group(pgid) {
                warn!(name = %self.spec.name, pgid, error = %e, "Failed to kill leftover process group");
            }
        }
    }

    /// Drop handles left by a run that is over.
    async fn release_handles(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            if let Some(child) = monitor.stop().await {
                // Only reachable if a record went terminal while its child lived
                if let Err(e) = terminate_tree(child).await {
                    warn!(name = %self.spec.name, error = %e, "Failed to reap leftover child");
                }
            }
        }
        self.kill_leftover_group();
        self.stdin = None;
        self.log = None;
    }
}

impl Drop for SupervisedProcess {
    fn drop(&mut self) {
        // The monitor hands the child back on cancel and drops it; kill_on_drop does the rest
        if let Some(monitor) = &self.monitor {
            monitor.cancel();
        }
        self.kill_leftover_group();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn options(dir: &std::path::Path) -> SupervisorOptions {
        SupervisorOptions {
            poll_interval: Duration::from_millis(50),
            log_directory: Some(dir.to_path_buf()),
            restart_delay: Duration::ZERO,
        }
    }

    async fn wait_for_state(process: &SupervisedProcess, want: ProcessState) {
        let mut rx = process.watch();
        timeout(Duration::from_secs(5), rx.wait_for(|r| r.state == want))
            .await
            .expect("timed out waiting for state")
            .expect("status cell closed");
    }

    #[tokio::test]
    async fn test_start_then_stop() {
        let dir = tempfile::tempdir().unwrap();
        let spec = ProcessSpec::new("sleeper", "sleep").with_arguments("30");
        let mut process =
            SupervisedProcess::new(spec, options(dir.path()), Arc::default(), None);

        process.start().await.unwrap();
        let record = process.snapshot();
        assert_eq!(record.state, ProcessState::Running);
        assert!(record.pid.is_some());
        assert!(record.started_at.is_some());
        assert_eq!(record.launches, 1);

        process.stop().await;
        let record = process.snapshot();
        assert_eq!(record.state, ProcessState::Stopped);
        assert!(record.pid.is_none());
    }

    #[tokio::test]
    async fn test_start_while_running_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let spec = ProcessSpec::new("sleeper", "sleep").with_arguments("30");
        let mut process =
            SupervisedProcess::new(spec, options(dir.path()), Arc::default(), None);

        process.start().await.unwrap();
        let err = process.start().await.unwrap_err();
        assert!(matches!(err, SupervisorError::InvalidTransition { .. }));
        assert_eq!(process.snapshot().launches, 1);

        process.stop().await;
    }

    #[tokio::test]
    async fn test_unexpected_exit_marks_failed() {
        let dir = tempfile::tempdir().unwrap();
        let spec = ProcessSpec::new("quitter", "sh").with_arguments("-c 'exit 3'");
        let mut process =
            SupervisedProcess::new(spec, options(dir.path()), Arc::default(), None);

        process.start().await.unwrap();
        wait_for_state(&process, ProcessState::Failed).await;
        assert_eq!(process.snapshot().last_exit_code, Some(3));

        // Stopping a failed process lands on Stopped
        process.stop().await;
        assert_eq!(process.state(), ProcessState::Stopped);
    }

    #[tokio::test]
    async fn test_launch_error_marks_failed() {
        let dir = tempfile::tempdir().unwrap();
        let spec = ProcessSpec::new("ghost", "/definitely/not/a/real/binary");
        let mut process =
            SupervisedProcess::new(spec, options(dir.path()), Arc::default(), None);

        let err = process.start().await.unwrap_err();
        assert!(matches!(err, SupervisorError::Launch { .. }));
        let record = process.snapshot();
        assert_eq!(record.state, ProcessState::Failed);
        assert_eq!(record.launches, 1);
    }

    #[tokio::test]
    async fn test_working_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let work = dir.path().join("nested").join("work");
        let spec = ProcessSpec::new("pwd", "sleep")
            .with_arguments("30")
            .with_working_directory(&work);
        let mut process =
            SupervisedProcess::new(spec, SupervisorOptions::default(), Arc::default(), None);

        process.start().await.unwrap();
        assert!(work.is_dir());
        let log_file = process.snapshot().log_file.unwrap();
        assert!(log_file.starts_with(&work));

        process.stop().await;
    }

    #[tokio::test]
    async fn test_unusable_working_directory_is_a_launch_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let spec = ProcessSpec::new("blocked", "sleep")
            .with_arguments("30")
            .with_working_directory(blocker.join("work"));
        let mut process =
            SupervisedProcess::new(spec, options(dir.path()), Arc::default(), None);

        let err = process.start().await.unwrap_err();
        assert!(matches!(err, SupervisorError::Launch { ref name, .. } if name == "blocked"));
        let record = process.snapshot();
        assert_eq!(record.state, ProcessState::Failed);
        assert_eq!(record.launches, 1);
        assert!(record.pid.is_none());
    }

    #[tokio::test]
    async fn test_send_command_when_not_running_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let spec = ProcessSpec::new("idle", "cat");
        let mut process =
            SupervisedProcess::new(spec, options(dir.path()), Arc::default(), None);

        // Never started: nothing to write to, and no panic
        process.send_command("hello");
        assert_eq!(process.state(), ProcessState::Starting);
    }

    #[tokio::test]
    async fn test_restart_reuses_record() {
        let dir = tempfile::tempdir().unwrap();
        let spec = ProcessSpec::new("sleeper", "sleep").with_arguments("30");
        let mut process =
            SupervisedProcess::new(spec, options(dir.path()), Arc::default(), None);

        process.start().await.unwrap();
        let first_pid = process.snapshot().pid;
        process.restart().await.unwrap();

        let record = process.snapshot();
        assert_eq!(record.state, ProcessState::Running);
        assert_eq!(record.launches, 2);
        assert_eq!(record.restart_count(), 1);
        assert_ne!(record.pid, first_pid);

        process.stop().await;
    }

    #[test]
    fn test_options_from_settings() {
        let settings = SupervisorSettings {
            poll_interval_ms: Some(10),
            restart_delay_ms: Some(250),
            ..Default::default()
        };
        let options = SupervisorOptions::from(&settings);
        assert_eq!(options.poll_interval, Duration::from_millis(50));
        assert_eq!(options.restart_delay, Duration::from_millis(250));
        assert!(options.log_directory.is_none());
    }
}
