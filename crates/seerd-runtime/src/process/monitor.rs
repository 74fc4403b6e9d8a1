//! Per-process monitor loop.
//!
//! The monitor owns the `Child` handle while the process runs. Every poll it
//! checks liveness with `try_wait` and refreshes CPU/memory. It ends in one
//! of two ways:
//!
//! - cancelled by `stop()`: hands the still-owned `Child` back so the
//!   stopper can kill and reap it;
//! - the child exited: if the record was still `Running` nobody asked for
//!   the exit, so the record flips to `Failed` and, under the auto-restart
//!   policy, a restart is requested.
//!
//! Poll and sampling errors are logged and contained here.

use std::sync::Arc;
use std::time::Duration;

use seerd_core::{OutputStream, ProcessState};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::logs::RunLog;
use super::sampler::ResourceSampler;
use super::status::StatusCell;

/// Request to restart a process after an unexpected exit.
///
/// `run` is the launch count at the time of the exit; a request whose run
/// no longer matches the record is stale and ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartRequest {
    pub name: String,
    pub run: u32,
}

/// Everything the loop needs besides the child itself.
pub struct MonitorContext {
    pub name: String,
    pub status: Arc<StatusCell>,
    pub log: RunLog,
    pub interval: Duration,
    /// Set only when the process should auto-restart.
    pub restarts: Option<mpsc::UnboundedSender<RestartRequest>>,
}

/// How the loop ended.
#[derive(Debug)]
pub enum MonitorExit {
    /// Cancelled while the child was still owned.
    Cancelled(Child),
    /// The child exited and was reaped by the loop.
    Exited,
}

/// Handle to a running monitor loop.
pub struct MonitorHandle {
    cancel: CancellationToken,
    task: JoinHandle<MonitorExit>,
}

impl MonitorHandle {
    /// Start monitoring `child`.
    pub fn spawn(ctx: MonitorContext, child: Child) -> Self {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(ctx, child, cancel.clone()));
        Self { cancel, task }
    }

    /// Cancel the loop and wait until it has observably stopped.
    ///
    /// Returns the child if it is still alive and owned by the loop.
    pub async fn stop(self) -> Option<Child> {
        self.cancel.cancel();
        match self.task.await {
            Ok(MonitorExit::Cancelled(child)) => Some(child),
            Ok(MonitorExit::Exited) => None,
            Err(e) => {
                warn!(error = %e, "Monitor task ended abnormally");
                None
            }
        }
    }

    /// Request cancellation without waiting. Used from `Drop`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

async fn run(ctx: MonitorContext, mut child: Child, cancel: CancellationToken) -> MonitorExit {
    let mut sampler = child.id().map(ResourceSampler::new);
    let mut ticker = interval(ctx.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    debug!(name = %ctx.name, pid = ?child.id(), "Starting monitor");

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(name = %ctx.name, "Monitor cancelled");
                return MonitorExit::Cancelled(child);
            }
            _ = ticker.tick() => {
                match child.try_wait() {
                    Ok(Some(status)) => {
                        on_exit(&ctx, status);
                        return MonitorExit::Exited;
                    }
                    Ok(None) => {
                        if let Some(s) = sampler.take() {
                            sampler = refresh_usage(&ctx, s).await;
                        }
                    }
                    Err(e) => {
                        warn!(name = %ctx.name, error = %e, "Failed to poll process status");
                    }
                }
            }
        }
    }
}

/// Sample on the blocking pool and store the result. Returns the sampler
/// for the next poll, or `None` if the blocking task died.
async fn refresh_usage(ctx: &MonitorContext, mut sampler: ResourceSampler) -> Option<ResourceSampler> {
    let joined = tokio::task::spawn_blocking(move || {
        let sample = sampler.sample();
        (sampler, sample)
    })
    .await;

    match joined {
        Ok((sampler, Some(sample))) => {
            ctx.status
                .record_usage(sample.cpu_time_ms, sample.memory_bytes);
            Some(sampler)
        }
        Ok((sampler, None)) => Some(sampler),
        Err(e) => {
            warn!(name = %ctx.name, error = %e, "Resource sampling failed, disabling");
            None
        }
    }
}

fn on_exit(ctx: &MonitorContext, status: std::process::ExitStatus) {
    let code = status.code();
    let failed = ctx.status.transition_if(
        |record| record.state == ProcessState::Running,
        |record| record.mark_failed(code),
    );

    let Some(record) = failed else {
        // The record already left Running: this exit was asked for
        debug!(name = %ctx.name, %status, "Exit observed during deliberate stop");
        return;
    };

    warn!(name = %ctx.name, %status, "Process exited unexpectedly");
    ctx.log.append(
        OutputStream::System,
        format!("Process exited unexpectedly ({status})"),
    );

    if let Some(restarts) = &ctx.restarts {
        let request = RestartRequest {
            name: ctx.name.clone(),
            run: record.launches,
        };
        if restarts.send(request).is_err() {
            debug!(name = %ctx.name, "Restart dispatcher gone, not restarting");
        }
    }
}
