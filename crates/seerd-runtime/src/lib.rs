//! Runtime for seerd: launches, monitors and stops supervised processes.
//!
//! [`ProcessRegistry`] is the engine adapters talk to, through the
//! [`seerd_core::ProcessSupervisor`] port. Everything that touches the OS
//! (spawning, stdio capture, process-group kills, resource sampling, run log
//! files) lives in this crate.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used only by the integration tests under tests/
#[cfg(test)]
use tokio_test as _;
#[cfg(all(test, not(unix)))]
use tempfile as _;

pub mod process;

pub use process::{
    DEFAULT_TAIL_LINES, ProcessRegistry, RunLog, StatusBroadcaster, SupervisedProcess,
    SupervisorOptions, tail_log,
};
