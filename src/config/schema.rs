//! Configuration schema definitions.
//!
//! This module defines the settings file of the daemon. All types derive
//! Serde traits for deserialization from TOML and every section has defaults,
//! so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Where profiles are persisted.
    pub storage: StorageConfig,

    /// Where the installed rule set is written.
    pub engine: EngineConfig,

    /// Apply behavior.
    pub apply: ApplyConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Profile storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the JSON file holding profiles, documents and pointers.
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "forward-rules/profiles.json".to_string(),
        }
    }
}

/// Rule engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Path of the JSON file holding the installed dynamic rules.
    pub rules_path: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules_path: "forward-rules/installed-rules.json".to_string(),
        }
    }
}

/// Apply configuration.
///
/// `enabled` and `cors_enabled` only seed the stored switches on first start;
/// afterwards the stored values win.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApplyConfig {
    /// Install rules at all.
    pub enabled: bool,

    /// Compile CORS header rules.
    pub cors_enabled: bool,

    /// Re-apply when the storage file changes on disk.
    pub watch_store: bool,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cors_enabled: true,
            watch_store: true,
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8181".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter (trace, debug, info, warn, error, or an env-filter directive).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9091".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.storage.path, "forward-rules/profiles.json");
        assert!(settings.apply.enabled);
        assert!(settings.admin.enabled);
        assert!(!settings.observability.metrics_enabled);
    }

    #[test]
    fn test_partial_sections() {
        let settings: Settings = toml::from_str(
            r#"
            [apply]
            cors_enabled = false

            [admin]
            bind_address = "127.0.0.1:9000"
            "#,
        )
        .unwrap();
        assert!(settings.apply.enabled);
        assert!(!settings.apply.cors_enabled);
        assert_eq!(settings.admin.bind_address, "127.0.0.1:9000");
        assert_eq!(settings.admin.api_key, "CHANGE_ME_IN_PRODUCTION");
    }
}
