//! Service settings validation.
//!
//! # Responsibilities
//! - Validate value ranges (poll interval, timeouts)
//! - Check addresses parse before anything binds
//! - Require a non-empty allowed mode set
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: ServerSettings → Result<(), Vec<SettingsIssue>>

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServerSettings;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsIssue {
    #[error("poll_interval_ms must be greater than 0")]
    ZeroPollInterval,

    #[error("request_timeout_secs must be greater than 0")]
    ZeroRequestTimeout,

    #[error("allowed_modes must not be empty")]
    NoAllowedModes,

    #[error("host '{0}' is empty")]
    EmptyHost(String),

    #[error("metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("log_level '{0}' is not one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

pub fn validate_settings(settings: &ServerSettings) -> Result<(), Vec<SettingsIssue>> {
    let mut issues = Vec::new();

    if settings.storage.poll_interval_ms == 0 {
        issues.push(SettingsIssue::ZeroPollInterval);
    }
    if settings.http.request_timeout_secs == 0 {
        issues.push(SettingsIssue::ZeroRequestTimeout);
    }
    if settings.storage.allowed_modes.is_empty() {
        issues.push(SettingsIssue::NoAllowedModes);
    }
    if settings.listener.host.trim().is_empty() {
        issues.push(SettingsIssue::EmptyHost(settings.listener.host.clone()));
    }

    let observability = &settings.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        issues.push(SettingsIssue::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }
    if !["trace", "debug", "info", "warn", "error"]
        .contains(&observability.log_level.to_ascii_lowercase().as_str())
    {
        issues.push(SettingsIssue::InvalidLogLevel(observability.log_level.clone()));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_settings(&ServerSettings::default()).is_ok());
    }

    #[test]
    fn test_collects_every_issue() {
        let mut settings = ServerSettings::default();
        settings.storage.poll_interval_ms = 0;
        settings.storage.allowed_modes.clear();
        settings.observability.metrics_enabled = true;
        settings.observability.metrics_address = "nowhere".into();

        let issues = validate_settings(&settings).unwrap_err();
        assert_eq!(
            issues,
            vec![
                SettingsIssue::ZeroPollInterval,
                SettingsIssue::NoAllowedModes,
                SettingsIssue::InvalidMetricsAddress("nowhere".into()),
            ]
        );
    }

    #[test]
    fn test_metrics_address_ignored_when_disabled() {
        let mut settings = ServerSettings::default();
        settings.observability.metrics_address = "nowhere".into();
        assert!(validate_settings(&settings).is_ok());
    }
}
