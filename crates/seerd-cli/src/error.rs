//! CLI-specific error types and mappings.
//!
//! This module maps engine and configuration errors to exit codes and
//! user-facing messages.

use seerd_core::{ConfigError, SupervisorError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Engine error with no more specific category.
    #[error("{0}")]
    Core(String),

    /// Argument or usage error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A supervised program could not be launched.
    #[error("Process error: {0}")]
    Process(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 0: Success
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Core(_) => 1,
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
            Self::Process(_) => 71,  // EX_OSERR
        }
    }
}

impl From<SupervisorError> for CliError {
    fn from(err: SupervisorError) -> Self {
        match err {
            SupervisorError::AlreadyMonitored(_)
            | SupervisorError::NotMonitored(_)
            | SupervisorError::InvalidTransition { .. }
            | SupervisorError::InvalidSpec(_) => Self::Arguments(err.to_string()),
            SupervisorError::Launch { .. } => Self::Process(err.to_string()),
            SupervisorError::Io(msg) => Self::Io(msg),
            SupervisorError::Internal(msg) => Self::Core(msg),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Read { .. } => Self::Io(err.to_string()),
            _ => Self::Config(err.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Exit code for an error bubbled up to `main`.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<CliError>().map_or(1, CliError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_supervisor_error_mapping() {
        let err: CliError = SupervisorError::AlreadyMonitored("web".into()).into();
        assert_eq!(err.exit_code(), 2);

        let err: CliError = SupervisorError::launch("web", "No such file").into();
        assert_eq!(err.exit_code(), 71);
        assert!(err.to_string().contains("web"));
    }

    #[test]
    fn test_config_error_mapping() {
        let err: CliError = ConfigError::Read {
            path: PathBuf::from("apps-config.json"),
            reason: "not found".into(),
        }
        .into();
        assert_eq!(err.exit_code(), 74);

        let err: CliError = ConfigError::DuplicateName("api".into()).into();
        assert_eq!(err.exit_code(), 78);
    }

    #[test]
    fn test_exit_code_through_anyhow() {
        let err = anyhow::Error::from(CliError::Config("bad".into()));
        assert_eq!(exit_code_for(&err), 78);
        assert_eq!(exit_code_for(&anyhow::anyhow!("plain")), 1);
    }
}
