//! Core domain types and port definitions for seerd.
//!
//! Nothing in this crate touches the OS: it defines what a supervised
//! process looks like ([`ProcessSpec`], [`ProcessRecord`]), the lifecycle
//! states, the error taxonomy, the configuration model, and the
//! [`ProcessSupervisor`] port implemented by `seerd-runtime`.

#![deny(unused_crate_dependencies)]

pub mod config;
pub mod domain;
pub mod ports;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{
    AppConfig, AppsConfig, ConfigError, SupervisorSettings, load_config, resolve_config_path,
    validate_apps,
};
pub use domain::{OutputStream, ProcessRecord, ProcessSpec, ProcessState};
pub use ports::{ProcessSupervisor, SupervisorError};
