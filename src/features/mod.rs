//! # Features Layer
//!
//! Each submodule is one self-contained piece of the local reconciliation
//! core. Features share the event bus and the key-value storage contract
//! but never depend on the composition root.

pub mod db_reset;
pub mod entries;
pub mod events;
pub mod tombstones;

pub use db_reset::{DatabaseFileSystem, DatabaseFiles, DatabaseReset, TokioFileSystem};
pub use entries::{
    filter_active_health_entries, filter_active_json, is_entry_tombstoned, preferred_entry_id,
    HealthEntry, TrackedEntry,
};
pub use events::{ChangeKind, HealthEntryChange, HealthEntryEvents, Subscription};
pub use tombstones::{
    should_use_tombstone_fallback, AdapterCapabilities, LocalDatabaseAdapter, TombstoneStore,
    TOMBSTONE_STORAGE_KEY,
};
