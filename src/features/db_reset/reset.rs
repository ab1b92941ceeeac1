//! Destructive reset of the local database files.

use super::files::{DatabaseFileSystem, DatabaseFiles, TokioFileSystem};
use crate::core::Config;
use crate::features::events::{ChangeKind, HealthEntryChange, HealthEntryEvents};
use log::{error, info, warn};
use std::sync::Arc;

#[derive(Clone)]
pub struct DatabaseReset {
    files: DatabaseFiles,
    fs: Arc<dyn DatabaseFileSystem>,
    events: Option<HealthEntryEvents>,
}

impl DatabaseReset {
    pub fn new(files: DatabaseFiles) -> Self {
        DatabaseReset {
            files,
            fs: Arc::new(TokioFileSystem),
            events: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(DatabaseFiles::from_config(config))
    }

    pub fn with_file_system(mut self, fs: Arc<dyn DatabaseFileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Emit a `sync` change after every successful reset
    pub fn with_events(mut self, events: HealthEntryEvents) -> Self {
        self.events = Some(events);
        self
    }

    pub fn files(&self) -> &DatabaseFiles {
        &self.files
    }

    /// Whether the primary database file is present. Any error reads as absent.
    pub async fn does_db_exist(&self) -> bool {
        match self.fs.exists(&self.files.primary).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!("Failed to check database file: {e:#}");
                false
            }
        }
    }

    /// Delete the primary, WAL and SHM files.
    ///
    /// Every file is attempted even if an earlier one fails. Absent files are
    /// skipped. Returns `true` only when nothing failed. The app must restart
    /// afterwards so the engine recreates the schema.
    pub async fn reset_corrupted_database(&self) -> bool {
        warn!(
            "Resetting local database at {}",
            self.files.primary.display()
        );

        let mut deleted = 0usize;
        let mut failed = 0usize;
        for path in self.files.all() {
            match self.fs.exists(path).await {
                Ok(false) => continue,
                Ok(true) => {}
                Err(e) => {
                    error!("Failed to check {}: {e:#}", path.display());
                    failed += 1;
                    continue;
                }
            }

            match self.fs.remove(path).await {
                Ok(()) => {
                    info!("Deleted {}", path.display());
                    deleted += 1;
                }
                Err(e) => {
                    error!("{e:#}");
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            error!("Database reset incomplete: {deleted} deleted, {failed} failed");
            return false;
        }

        info!("Database reset complete, {deleted} files deleted. Restart required");
        if let Some(events) = &self.events {
            events.emit(&HealthEntryChange::now(ChangeKind::Sync));
        }
        true
    }
}
