//! Domain types for supervised processes.

mod process;

pub use process::{OutputStream, ProcessRecord, ProcessSpec, ProcessState};
