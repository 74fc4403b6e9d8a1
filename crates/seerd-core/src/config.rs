//! Supervisor configuration types and validation.
//!
//! The configuration file is a JSON document listing the apps to supervise,
//! in start order, plus optional engine settings:
//!
//! ```json
//! {
//!   "apps": [
//!     { "name": "api", "executablePath": "/opt/api/bin/api",
//!       "arguments": "--port 8080", "workingDirectory": "/opt/api",
//!       "autoRestart": true }
//!   ],
//!   "supervisor": { "pollIntervalMs": 1000 }
//! }
//! ```
//!
//! Keys are camelCase; the PascalCase spellings of older files are accepted
//! as aliases.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ProcessSpec;
use crate::utils::split_arguments;

/// Default file name looked up next to the executable and in the cwd.
pub const DEFAULT_CONFIG_FILE: &str = "apps-config.json";

/// Environment variable overriding the config path.
pub const CONFIG_ENV_VAR: &str = "SEERD_CONFIG";

/// Default monitor poll interval.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Lower bound for the poll interval.
pub const MIN_POLL_INTERVAL_MS: u64 = 50;

/// Errors loading or validating the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse config {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("App #{index} has an empty name")]
    EmptyName { index: usize },

    #[error("App name {0} is used more than once")]
    DuplicateName(String),

    #[error("App {0} has an empty executable path")]
    EmptyExecutable(String),

    #[error("App {name} has an invalid argument string: {reason}")]
    InvalidArguments { name: String, reason: String },
}

/// One configured app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "ExecutablePath")]
    pub executable_path: PathBuf,
    #[serde(default, alias = "Arguments")]
    pub arguments: String,
    #[serde(default, alias = "WorkingDirectory")]
    pub working_directory: Option<PathBuf>,
    /// Overrides [`SupervisorSettings::auto_restart`] for this app.
    #[serde(default, alias = "AutoRestart")]
    pub auto_restart: Option<bool>,
}

impl AppConfig {
    /// Resolve into an immutable spec, applying settings defaults.
    pub fn to_spec(&self, settings: &SupervisorSettings) -> ProcessSpec {
        let spec = ProcessSpec::new(self.name.clone(), self.executable_path.clone())
            .with_arguments(self.arguments.clone())
            .with_auto_restart(
                self.auto_restart
                    .unwrap_or_else(|| settings.effective_auto_restart()),
            );
        match &self.working_directory {
            Some(dir) => spec.with_working_directory(dir.clone()),
            None => spec,
        }
    }
}

/// Engine-wide settings. All fields are optional with defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SupervisorSettings {
    /// Monitor poll interval in milliseconds.
    pub poll_interval_ms: Option<u64>,
    /// Default auto-restart policy for apps that don't set one.
    pub auto_restart: Option<bool>,
    /// Directory for per-run log files. Defaults to each app's working directory.
    pub log_directory: Option<PathBuf>,
    /// Delay before an auto-restart spawns again, in milliseconds.
    pub restart_delay_ms: Option<u64>,
}

impl SupervisorSettings {
    /// Poll interval, clamped to [`MIN_POLL_INTERVAL_MS`].
    pub fn effective_poll_interval(&self) -> Duration {
        let ms = self
            .poll_interval_ms
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS)
            .max(MIN_POLL_INTERVAL_MS);
        Duration::from_millis(ms)
    }

    pub fn effective_auto_restart(&self) -> bool {
        self.auto_restart.unwrap_or(false)
    }

    pub fn effective_restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms.unwrap_or(0))
    }
}

/// Root of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppsConfig {
    #[serde(default, alias = "Apps")]
    pub apps: Vec<AppConfig>,
    #[serde(default, alias = "Supervisor")]
    pub supervisor: SupervisorSettings,
}

impl AppsConfig {
    /// Parse and validate a configuration document.
    pub fn from_json(path: &Path, json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        validate_apps(&config.apps)?;
        Ok(config)
    }

    /// Specs for every app, in file order.
    pub fn specs(&self) -> Vec<ProcessSpec> {
        self.apps
            .iter()
            .map(|app| app.to_spec(&self.supervisor))
            .collect()
    }
}

/// Read, parse and validate the configuration file at `path`.
pub fn load_config(path: &Path) -> Result<AppsConfig, ConfigError> {
    let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    AppsConfig::from_json(path, &json)
}

/// Validate a list of apps.
///
/// Names must be non-empty and unique, executables non-empty, and argument
/// strings must split cleanly.
pub fn validate_apps(apps: &[AppConfig]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for (index, app) in apps.iter().enumerate() {
        if app.name.trim().is_empty() {
            return Err(ConfigError::EmptyName { index });
        }
        if !seen.insert(app.name.as_str()) {
            return Err(ConfigError::DuplicateName(app.name.clone()));
        }
        if app.executable_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyExecutable(app.name.clone()));
        }
        if let Err(e) = split_arguments(&app.arguments) {
            return Err(ConfigError::InvalidArguments {
                name: app.name.clone(),
                reason: e.to_string(),
            });
        }
    }
    Ok(())
}

/// Resolve which configuration file to use.
///
/// Order: explicit path, `SEERD_CONFIG`, next to the executable, then the
/// current directory. The last candidate is returned even if it does not
/// exist so the caller can report it.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_CONFIG_FILE)));
    match beside_exe {
        Some(path) if path.is_file() => path,
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "apps": [
            { "name": "api", "executablePath": "/opt/api", "arguments": "--port 80",
              "workingDirectory": "/srv/api", "autoRestart": true },
            { "name": "worker", "executablePath": "/opt/worker" }
        ],
        "supervisor": { "pollIntervalMs": 10, "autoRestart": false }
    }"#;

    #[test]
    fn test_parse_sample() {
        let config = AppsConfig::from_json(Path::new("x.json"), SAMPLE).unwrap();
        assert_eq!(config.apps.len(), 2);
        let specs = config.specs();
        assert_eq!(specs[0].name, "api");
        assert!(specs[0].auto_restart);
        assert_eq!(specs[0].working_directory, Some(PathBuf::from("/srv/api")));
        assert!(!specs[1].auto_restart);
        assert!(specs[1].arguments.is_empty());
    }

    #[test]
    fn test_poll_interval_is_clamped() {
        let config = AppsConfig::from_json(Path::new("x.json"), SAMPLE).unwrap();
        assert_eq!(
            config.supervisor.effective_poll_interval(),
            Duration::from_millis(MIN_POLL_INTERVAL_MS)
        );
        assert_eq!(
            SupervisorSettings::default().effective_poll_interval(),
            Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
        );
    }

    #[test]
    fn test_pascal_case_aliases() {
        let json = r#"{ "Apps": [ { "Name": "legacy", "ExecutablePath": "legacy.exe",
            "Arguments": "", "WorkingDirectory": "" } ] }"#;
        let config = AppsConfig::from_json(Path::new("x.json"), json).unwrap();
        let spec = &config.specs()[0];
        assert_eq!(spec.name, "legacy");
        assert!(spec.working_directory.is_none());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let json = r#"{ "apps": [ { "name": "a", "executablePath": "x" },
                                  { "name": "a", "executablePath": "y" } ] }"#;
        let err = AppsConfig::from_json(Path::new("x.json"), json).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName(name) if name == "a"));
    }

    #[test]
    fn test_empty_name_rejected() {
        let json = r#"{ "apps": [ { "name": "", "executablePath": "x" } ] }"#;
        let err = AppsConfig::from_json(Path::new("x.json"), json).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyName { index: 0 }));
    }

    #[test]
    fn test_bad_arguments_rejected() {
        let json = r#"{ "apps": [ { "name": "a", "executablePath": "x", "arguments": "'open" } ] }"#;
        let err = AppsConfig::from_json(Path::new("x.json"), json).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidArguments { .. }));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.apps[1].name, "worker");
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_explicit_path_wins() {
        let path = resolve_config_path(Some(Path::new("/etc/seerd.json")));
        assert_eq!(path, PathBuf::from("/etc/seerd.json"));
    }
}
