//! Process supervision engine.
//!
//! # Structure
//!
//! - `ProcessRegistry` - name-keyed multiplexer, implements `ProcessSupervisor`
//! - `SupervisedProcess` - one child process and its lifecycle
//! - `MonitorHandle` - per-process liveness/resource poll loop
//! - `StatusBroadcaster` / `StatusCell` - transition publishing and snapshots
//! - `StdinWriter` - non-blocking line delivery to a child's stdin
//! - `RunLog` - per-run `[OUT]`/`[ERR]`/`[SYS]` log files
//! - `terminate_tree` - forced termination of a child and its descendants

mod broadcaster;
mod command;
mod logs;
mod monitor;
mod registry;
mod sampler;
pub mod shutdown;
mod status;
mod stdin;
mod stream;
mod supervised;

// Re-export commonly used types
pub use broadcaster::{CHANNEL_CAPACITY, StatusBroadcaster};
pub use command::LINE_ENDING;
pub use logs::{DEFAULT_TAIL_LINES, RunLog, log_file_name, tail_log};
pub use monitor::RestartRequest;
pub use registry::ProcessRegistry;
pub use sampler::{ResourceSample, ResourceSampler};
pub use shutdown::{kill_process_group, terminate_tree};
pub use status::StatusCell;
pub use stdin::{STDIN_QUEUE_CAPACITY, SendRejected, StdinWriter};
pub use supervised::{SupervisedProcess, SupervisorOptions};
