//! Storefront configuration.
//!
//! Loaded from `STOREFRONT_*` environment variables with fallback to
//! defaults. The database file defaults to the platform data directory:
//!
//! - **macOS**: `~/Library/Application Support/in.kotaiahs.storefront/storefront.db`
//! - **Windows**: `%APPDATA%\kotaiahs\storefront\data\storefront.db`
//! - **Linux**: `~/.local/share/storefront/storefront.db`

use std::env;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use sweets_db::DbConfig;

const DEFAULT_LOG_FILTER: &str = "info,sweets=debug,sqlx=warn";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorefrontConfig {
    /// SQLite database file
    pub db_path: PathBuf,

    /// Pool size (default: 5)
    pub db_max_connections: u32,

    /// Shown in logs and health output
    pub store_name: String,

    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = match lookup("STOREFRONT_DB_PATH") {
            Some(path) if path.trim().is_empty() => {
                return Err(ConfigError::InvalidValue("STOREFRONT_DB_PATH".to_string()))
            }
            Some(path) => PathBuf::from(path),
            None => default_db_path()?,
        };

        let db_max_connections = lookup("STOREFRONT_DB_MAX_CONNECTIONS")
            .unwrap_or_else(|| "5".to_string())
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| ConfigError::InvalidValue("STOREFRONT_DB_MAX_CONNECTIONS".to_string()))?;

        let store_name =
            lookup("STOREFRONT_STORE_NAME").unwrap_or_else(|| "Kotaiah's Sweets".to_string());

        let log_filter =
            lookup("STOREFRONT_LOG_FILTER").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(StorefrontConfig {
            db_path,
            db_max_connections,
            store_name,
            log_filter,
        })
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.db_path.clone()).max_connections(self.db_max_connections)
    }
}

fn default_db_path() -> Result<PathBuf, ConfigError> {
    let dirs = ProjectDirs::from("in", "kotaiahs", "storefront")
        .ok_or_else(|| ConfigError::MissingRequired("STOREFRONT_DB_PATH".to_string()))?;
    Ok(dirs.data_dir().join("storefront.db"))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    /// No platform data directory and no explicit path.
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
