//! Command handlers.
//!
//! Handlers are thin wrappers that:
//! 1. Parse/validate CLI-specific input
//! 2. Call the engine through the `ProcessSupervisor` port
//! 3. Format output for the terminal
//!
//! Lifecycle rules (duplicate names, state checks, restarts) belong to the
//! engine, not here.

pub mod check;
pub mod console;
pub mod info;
pub mod list;
pub mod logs;
pub mod run;
