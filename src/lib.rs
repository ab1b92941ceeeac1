// Core layer - shared types and configuration
pub mod core;

// Storage layer - durable key-value backends
pub mod storage;

// Features layer - all feature modules
pub mod features;

// Application layer
pub mod local_data;

pub use core::{Config, WriteOutcome};

pub use features::{
    // Database reset
    DatabaseFiles, DatabaseReset,
    // Entries
    filter_active_health_entries, filter_active_json, is_entry_tombstoned, preferred_entry_id,
    HealthEntry, TrackedEntry,
    // Events
    ChangeKind, HealthEntryChange, HealthEntryEvents, Subscription,
    // Tombstones
    should_use_tombstone_fallback, AdapterCapabilities, LocalDatabaseAdapter, TombstoneStore,
};

pub use local_data::LocalDataLayer;
pub use storage::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
