//! Settings loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::{LogFormat, ServerSettings};
use crate::config::validation::{validate_settings, SettingsIssue};
use crate::store::Mode;

/// Environment variable naming an optional TOML settings file.
pub const SETTINGS_PATH_ENV: &str = "MODE_CONTROL_SETTINGS";

/// Error type for settings loading.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value '{value}' for {key}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Validation failed: {}", join_issues(.0))]
    Validation(Vec<SettingsIssue>),
}

fn join_issues(issues: &[SettingsIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load settings the way the service binary does: optional file named by
/// `MODE_CONTROL_SETTINGS`, then process environment overrides.
pub fn load_from_env() -> Result<ServerSettings, SettingsError> {
    let path = std::env::var_os(SETTINGS_PATH_ENV).map(PathBuf::from);
    load_settings(path.as_deref(), |key| std::env::var(key).ok())
}

/// Load settings from an optional TOML file, apply overrides from `env`,
/// and validate the result.
pub fn load_settings<F>(path: Option<&Path>, env: F) -> Result<ServerSettings, SettingsError>
where
    F: Fn(&str) -> Option<String>,
{
    let settings = match path {
        Some(path) => parse_file(path)?,
        None => ServerSettings::default(),
    };
    let settings = apply_env_overrides(settings, env)?;

    validate_settings(&settings).map_err(SettingsError::Validation)?;
    Ok(settings)
}

fn parse_file(path: &Path) -> Result<ServerSettings, SettingsError> {
    let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Environment variables that override file settings.
pub fn apply_env_overrides<F>(
    mut settings: ServerSettings,
    env: F,
) -> Result<ServerSettings, SettingsError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = env("HOST") {
        settings.listener.host = host;
    }
    if let Some(port) = env("PORT") {
        settings.listener.port = parse_env("PORT", port)?;
    }
    if let Some(dir) = env("MODE_CONTROL_HOME") {
        settings.storage.install_dir = PathBuf::from(dir);
    }
    if let Some(ms) = env("MODE_CONTROL_POLL_INTERVAL_MS") {
        settings.storage.poll_interval_ms = parse_env("MODE_CONTROL_POLL_INTERVAL_MS", ms)?;
    }
    if let Some(modes) = env("MODE_CONTROL_ALLOWED_MODES") {
        settings.storage.allowed_modes = modes
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(|m| m.parse::<Mode>())
            .collect::<Result<_, _>>()
            .map_err(|_| SettingsError::InvalidEnv {
                key: "MODE_CONTROL_ALLOWED_MODES",
                value: modes.clone(),
            })?;
    }
    if let Some(level) = env("MODE_CONTROL_LOG_LEVEL") {
        settings.observability.log_level = level;
    }
    if let Some(format) = env("MODE_CONTROL_LOG_FORMAT") {
        settings.observability.log_format = match format.as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => {
                return Err(SettingsError::InvalidEnv {
                    key: "MODE_CONTROL_LOG_FORMAT",
                    value: format,
                })
            }
        };
    }

    Ok(settings)
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, SettingsError> {
    value
        .trim()
        .parse()
        .map_err(|_| SettingsError::InvalidEnv { key, value })
}
