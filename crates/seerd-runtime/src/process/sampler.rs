//! Resource sampling for a single process using sysinfo.
//!
//! Values are best-effort observability data. A missing process or a
//! failed refresh yields `None`, never an error.

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// One CPU/memory reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSample {
    /// Cumulative CPU time since the process started.
    pub cpu_time_ms: u64,
    /// Resident set size.
    pub memory_bytes: u64,
}

/// Samples one PID, reusing its `System` between calls.
pub struct ResourceSampler {
    system: System,
    pid: Pid,
}

impl ResourceSampler {
    pub fn new(pid: u32) -> Self {
        Self {
            system: System::new(),
            pid: Pid::from_u32(pid),
        }
    }

    /// Refresh and read the process. Blocking: reads `/proc` or the
    /// platform equivalent, so call it from a blocking-friendly context.
    pub fn sample(&mut self) -> Option<ResourceSample> {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );
        self.system.process(self.pid).map(|process| ResourceSample {
            cpu_time_ms: process.accumulated_cpu_time(),
            memory_bytes: process.memory(),
        })
    }
}
