//! # Feature: Tombstones
//!
//! Soft-delete fallback for records the local database cannot update in
//! place, typically rows written before a schema migration that lack the
//! columns an update needs. Their ids are hidden until a later sync or
//! migration cleans them up physically.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Explicit adapter capability descriptor for fallback detection
//! - 1.0.0: Initial release with persisted tombstone set

pub mod fallback;
pub mod store;

pub use fallback::{should_use_tombstone_fallback, AdapterCapabilities, LocalDatabaseAdapter};
pub use store::{TombstoneStore, TOMBSTONE_STORAGE_KEY};
