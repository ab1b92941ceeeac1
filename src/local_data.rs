//! # Local Data Layer
//!
//! Composition root for the offline reconciliation core. Owns one change
//! event bus and wires it into the tombstone store and the database reset,
//! so every state change they apply reaches the same subscribers.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

use crate::core::Config;
use crate::features::db_reset::DatabaseReset;
use crate::features::entries::{filter_active_health_entries, TrackedEntry};
use crate::features::events::HealthEntryEvents;
use crate::features::tombstones::TombstoneStore;
use crate::storage::{KeyValueStore, SqliteKeyValueStore};
use anyhow::Result;
use log::info;
use std::sync::Arc;

#[derive(Clone)]
pub struct LocalDataLayer {
    events: HealthEntryEvents,
    tombstones: TombstoneStore,
    reset: DatabaseReset,
}

impl LocalDataLayer {
    /// Open the durable key-value store from `config` and build the layer on it
    pub fn open(config: &Config) -> Result<Self> {
        let store = SqliteKeyValueStore::open(&config.kv_store_path)?;
        info!(
            "Local data layer opened (kv store: {}, database dir: {})",
            config.kv_store_path.display(),
            config.database_dir().display()
        );
        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Build the layer on an arbitrary key-value store
    pub fn with_store(config: &Config, store: Arc<dyn KeyValueStore>) -> Self {
        let events = HealthEntryEvents::new();
        LocalDataLayer {
            tombstones: TombstoneStore::new(store).with_events(events.clone()),
            reset: DatabaseReset::from_config(config).with_events(events.clone()),
            events,
        }
    }

    pub fn events(&self) -> &HealthEntryEvents {
        &self.events
    }

    pub fn tombstones(&self) -> &TombstoneStore {
        &self.tombstones
    }

    pub fn reset(&self) -> &DatabaseReset {
        &self.reset
    }

    /// Filter `entries` against a tombstone snapshot read for this call
    pub async fn visible_entries<T: TrackedEntry>(&self, entries: Option<Vec<T>>) -> Vec<T> {
        let tombstones = self.tombstones.list_tombstones().await;
        filter_active_health_entries(entries, &tombstones)
    }
}
