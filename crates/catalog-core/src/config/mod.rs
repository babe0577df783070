//! Application configuration schemas.
//!
//! Configuration is deserialized from an optional TOML file merged with
//! `CATALOG__`-prefixed environment variables via the `config` crate.

pub mod catalog;
pub mod database;
pub mod logging;
pub mod uploads;

use serde::{Deserialize, Serialize};

pub use self::catalog::{CatalogConfig, CoverPolicy, DeletePolicy, DuplicatePolicy};
pub use self::database::DatabaseConfig;
pub use self::logging::{LogFormat, LoggingConfig};
pub use self::uploads::UploadsConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Catalog behaviour policies.
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// File intake settings.
    #[serde(default)]
    pub uploads: UploadsConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file and the environment.
    ///
    /// The file is optional. Environment variables use the `CATALOG`
    /// prefix and `__` as the section separator, e.g.
    /// `CATALOG__DATABASE__URL`.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("CATALOG")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = AppConfig::load("does/not/exist").expect("defaults");
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.catalog.cover_policy, CoverPolicy::Replace);
        assert_eq!(config.catalog.delete_policy, DeletePolicy::Restrict);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_policy_deserialization() {
        let json = r#"{"cover_policy":"reject","duplicate_assignment":"reject","delete_policy":"reparent_to_parent"}"#;
        let catalog: CatalogConfig = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.cover_policy, CoverPolicy::Reject);
        assert_eq!(catalog.duplicate_assignment, DuplicatePolicy::Reject);
        assert_eq!(catalog.delete_policy, DeletePolicy::ReparentToParent);
    }
}
