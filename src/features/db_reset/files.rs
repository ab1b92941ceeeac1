//! On-disk artifacts of the local database and the filesystem they live on.

use crate::core::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

// ============================================================================
// Constants
// ============================================================================

/// Extension of the primary store file
pub const PRIMARY_EXTENSION: &str = "db";

/// Suffix appended to the primary file name for the write-ahead log
pub const WAL_SUFFIX: &str = "-wal";

/// Suffix appended to the primary file name for the shared-memory index
pub const SHM_SUFFIX: &str = "-shm";

// ============================================================================
// Database files
// ============================================================================

/// The three files managed as one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseFiles {
    pub primary: PathBuf,
    pub wal: PathBuf,
    pub shm: PathBuf,
}

impl DatabaseFiles {
    /// Files for database `name` inside `dir`: `<name>.db`, `<name>.db-wal`, `<name>.db-shm`
    pub fn new<P: AsRef<Path>>(dir: P, name: &str) -> Self {
        let dir = dir.as_ref();
        let primary_name = format!("{name}.{PRIMARY_EXTENSION}");
        DatabaseFiles {
            primary: dir.join(&primary_name),
            wal: dir.join(format!("{primary_name}{WAL_SUFFIX}")),
            shm: dir.join(format!("{primary_name}{SHM_SUFFIX}")),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.database_dir(), &config.database_name)
    }

    /// Primary, WAL, SHM, in that order
    pub fn all(&self) -> [&Path; 3] {
        [self.primary.as_path(), self.wal.as_path(), self.shm.as_path()]
    }
}

// ============================================================================
// Filesystem
// ============================================================================

/// Minimal async filesystem surface needed by the reset
#[async_trait]
pub trait DatabaseFileSystem: Send + Sync {
    async fn exists(&self, path: &Path) -> Result<bool>;

    async fn remove(&self, path: &Path) -> Result<()>;
}

/// Real filesystem via `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileSystem;

#[async_trait]
impl DatabaseFileSystem for TokioFileSystem {
    async fn exists(&self, path: &Path) -> Result<bool> {
        match tokio::fs::metadata(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to stat {}", path.display())),
        }
    }

    async fn remove(&self, path: &Path) -> Result<()> {
        tokio::fs::remove_file(path)
            .await
            .with_context(|| format!("Failed to delete {}", path.display()))
    }
}
