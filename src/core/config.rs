//! # Configuration
//!
//! Environment-driven settings for the local data layer. The binary loads a
//! `.env` file with `dotenvy` before calling [`Config::from_env`].
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::{anyhow, Result};
use std::env;
use std::path::PathBuf;

/// Default document-storage root
pub const DEFAULT_DOCUMENT_DIR: &str = "./data";

/// Default database base name, shared with the mobile app's embedded database
pub const DEFAULT_DB_NAME: &str = "RANCAppDB";

/// Subdirectory of the document root holding the database files
pub const DATABASE_SUBDIR: &str = "SQLite";

/// File name of the durable key-value store inside the document root
pub const DEFAULT_KV_FILE: &str = "kv_store.sqlite";

#[derive(Debug, Clone)]
pub struct Config {
    pub document_dir: PathBuf,
    pub database_name: String,
    pub kv_store_path: PathBuf,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        let document_dir = PathBuf::from(DEFAULT_DOCUMENT_DIR);
        Config {
            kv_store_path: document_dir.join(DEFAULT_KV_FILE),
            document_dir,
            database_name: DEFAULT_DB_NAME.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Build configuration from `RANC_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let document_dir = lookup("RANC_DOCUMENT_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCUMENT_DIR));

        let database_name = lookup("RANC_DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string());
        if database_name.trim().is_empty() {
            return Err(anyhow!("RANC_DB_NAME must not be empty"));
        }

        let kv_store_path = lookup("RANC_KV_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| document_dir.join(DEFAULT_KV_FILE));

        let log_level = lookup("RANC_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Config {
            document_dir,
            database_name,
            kv_store_path,
            log_level,
        })
    }

    /// Directory containing the primary, WAL and SHM database files
    pub fn database_dir(&self) -> PathBuf {
        self.document_dir.join(DATABASE_SUBDIR)
    }
}
