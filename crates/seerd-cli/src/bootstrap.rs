//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where the engine is wired together for the
//! CLI adapter: the configuration file is resolved and loaded here and the
//! process registry is created with the engine settings it carries.
//!
//! Command handlers receive the composed context and talk to the engine
//! through the `ProcessSupervisor` port.

use std::path::PathBuf;
use std::sync::Arc;

use seerd_core::{AppsConfig, ProcessSupervisor, load_config, resolve_config_path};
use seerd_runtime::{ProcessRegistry, SupervisorOptions};
use tracing::{info, warn};

use crate::error::CliError;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Explicit configuration file (`--config` / `SEERD_CONFIG`).
    pub config_path: Option<PathBuf>,
    /// Fail if the configuration file does not exist.
    pub require_config: bool,
}

/// Fully composed application context for CLI commands.
pub struct CliContext {
    /// The engine.
    pub registry: Arc<ProcessRegistry>,
    /// Loaded configuration (empty if none was found and none was required).
    pub apps: AppsConfig,
    /// The configuration file that was resolved.
    pub config_path: PathBuf,
}

impl CliContext {
    /// Access the engine through its port.
    pub fn supervisor(&self) -> &dyn ProcessSupervisor {
        self.registry.as_ref()
    }

    /// Access the concrete registry for bulk operations.
    pub fn registry(&self) -> &Arc<ProcessRegistry> {
        &self.registry
    }
}

/// Load the configuration file, or an empty one if it is optional and absent.
pub fn load_apps(config: &CliConfig) -> Result<(PathBuf, AppsConfig), CliError> {
    let path = resolve_config_path(config.config_path.as_deref());
    if !path.exists() && !config.require_config {
        warn!(path = %path.display(), "Configuration file not found, starting with no apps");
        return Ok((path, AppsConfig::default()));
    }

    let apps = load_config(&path)?;
    info!(path = %path.display(), apps = apps.apps.len(), "Loaded configuration");
    Ok((path, apps))
}

/// Bootstrap the CLI application.
///
/// Must run inside the Tokio runtime: the registry spawns its restart
/// dispatcher on creation.
pub fn bootstrap(config: &CliConfig) -> Result<CliContext, CliError> {
    let (config_path, apps) = load_apps(config)?;
    let options = SupervisorOptions::from(&apps.supervisor);
    let registry = Arc::new(ProcessRegistry::new(options));

    Ok(CliContext {
        registry,
        apps,
        config_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[tokio::test]
    async fn test_bootstrap_applies_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "apps": [ {{ "name": "api", "executablePath": "/bin/sleep", "arguments": "30" }} ],
                 "supervisor": {{ "pollIntervalMs": 250 }} }}"#
        )
        .unwrap();

        let ctx = bootstrap(&CliConfig {
            config_path: Some(file.path().to_path_buf()),
            require_config: true,
        })
        .unwrap();

        assert_eq!(ctx.apps.apps.len(), 1);
        assert_eq!(ctx.registry().options().poll_interval, Duration::from_millis(250));
        assert!(ctx.supervisor().get_all().is_empty());
    }

    #[tokio::test]
    async fn test_missing_optional_config_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = bootstrap(&CliConfig {
            config_path: Some(dir.path().join("absent.json")),
            require_config: false,
        })
        .unwrap();
        assert!(ctx.apps.apps.is_empty());
    }

    #[test]
    fn test_missing_required_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_apps(&CliConfig {
            config_path: Some(dir.path().join("absent.json")),
            require_config: true,
        });
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
