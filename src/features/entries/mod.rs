//! # Feature: Health Entries
//!
//! Identity of locally cached health entries and the visibility filter that
//! combines each entry's own delete flag with the tombstone set.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod filter;
pub mod identity;

pub use filter::{filter_active_health_entries, filter_active_json};
pub use identity::{is_entry_tombstoned, preferred_entry_id, HealthEntry, TrackedEntry};
