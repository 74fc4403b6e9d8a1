//! Port definitions (trait abstractions) for the supervision engine.
//!
//! Adapters (CLI, service host, tests) talk to the engine only through
//! [`ProcessSupervisor`]. The error type here is the canonical taxonomy for
//! lifecycle commands.

pub mod supervisor;

use thiserror::Error;

use crate::domain::ProcessState;

pub use supervisor::ProcessSupervisor;

/// Errors surfaced synchronously by lifecycle commands.
///
/// Unexpected exits are not errors: they are state transitions reported
/// through the status channel. Queries for unknown names return `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SupervisorError {
    /// A start was requested for a name that is already in the registry.
    #[error("Process {0} is already being monitored")]
    AlreadyMonitored(String),

    /// The OS refused to spawn the executable.
    #[error("Failed to launch {name}: {reason}")]
    Launch { name: String, reason: String },

    /// A command that needs an existing entry named an absent process.
    #[error("Process {0} is not being monitored")]
    NotMonitored(String),

    /// A lifecycle operation is not valid in the current state.
    #[error("Process {name} cannot {action} while {state}")]
    InvalidTransition {
        name: String,
        action: &'static str,
        state: ProcessState,
    },

    /// The spec violates a registry invariant.
    #[error("Invalid process spec: {0}")]
    InvalidSpec(String),

    /// Filesystem error outside of the spawn itself (working dir, log file).
    #[error("IO error: {0}")]
    Io(String),

    /// Internal error (unexpected condition).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SupervisorError {
    /// Build a launch error from any displayable cause.
    pub fn launch(name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Launch {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}
