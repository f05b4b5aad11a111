//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and paths
//! - Validate the log filter
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Settings → Result<(), Vec<ValidationError>>
//! - Runs before settings are accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::Settings;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("storage.path and engine.rules_path must differ")]
    SharedPath,

    #[error("observability.log_level is not a valid filter: {0}")]
    InvalidLogLevel(String),
}

pub fn validate_settings(settings: &Settings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.storage.path.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "storage.path" });
    }
    if settings.engine.rules_path.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "engine.rules_path" });
    }
    if settings.storage.path == settings.engine.rules_path {
        errors.push(ValidationError::SharedPath);
    }

    if settings.admin.enabled {
        if settings.admin.api_key.is_empty() {
            errors.push(ValidationError::Empty { field: "admin.api_key" });
        }
        check_address(&mut errors, "admin.bind_address", &settings.admin.bind_address);
    }

    if settings.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &settings.observability.metrics_address,
        );
    }

    if EnvFilter::try_new(&settings.observability.log_level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(
            settings.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_settings(&Settings::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut settings = Settings::default();
        settings.storage.path = "same.json".into();
        settings.engine.rules_path = "same.json".into();
        settings.admin.bind_address = "nowhere".into();
        settings.admin.api_key.clear();
        settings.observability.metrics_enabled = true;
        settings.observability.metrics_address = "also-nowhere".into();

        let errors = validate_settings(&settings).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::SharedPath));
        assert!(errors.contains(&ValidationError::Empty { field: "admin.api_key" }));
    }

    #[test]
    fn test_disabled_admin_is_not_checked() {
        let mut settings = Settings::default();
        settings.admin.enabled = false;
        settings.admin.bind_address = "nowhere".into();
        assert!(validate_settings(&settings).is_ok());
    }
}
