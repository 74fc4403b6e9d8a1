//! Command-line adapter for seerd.
//!
//! `seerd run` hosts the configured apps until Ctrl-C, `seerd console` opens
//! an interactive shell over the same engine, and `seerd check` validates a
//! configuration file. All engine access goes through the
//! [`seerd_core::ProcessSupervisor`] port, wired up in [`bootstrap`].

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by the binary entry point
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;
pub mod utils;

// Re-export primary types for convenient access
pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::Commands;
pub use error::CliError;
pub use parser::Cli;
