//! Entry identity resolution.
//!
//! The remote id wins once it exists because it is stable across devices
//! and re-syncs. Local database ids are device-local.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Anything the local data layer can classify as visible or hidden.
///
/// Empty identifiers are treated as absent.
pub trait TrackedEntry {
    /// Remote-canonical id (`convexId`)
    fn remote_id(&self) -> Option<&str>;

    /// Local embedded-database id (`_id`)
    fn local_id(&self) -> Option<&str>;

    /// Generic `id` field, used only when neither of the above is present
    fn generic_id(&self) -> Option<&str> {
        None
    }

    /// The entry's own soft-delete flag
    fn is_deleted(&self) -> bool;
}

/// Resolve the identifier used for tombstone bookkeeping.
///
/// Order: remote id, local id, generic id, else `None`.
pub fn preferred_entry_id<T: TrackedEntry + ?Sized>(entry: &T) -> Option<&str> {
    entry
        .remote_id()
        .or_else(|| entry.local_id())
        .or_else(|| entry.generic_id())
}

/// Whether `entry` resolves to an id present in `tombstones`
pub fn is_entry_tombstoned<T: TrackedEntry + ?Sized>(
    entry: &T,
    tombstones: &HashSet<String>,
) -> bool {
    match preferred_entry_id(entry) {
        Some(id) => tombstones.contains(id),
        None => false,
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

// ============================================================================
// Typed entry
// ============================================================================

/// A cached health entry as stored locally.
///
/// Only the identity and delete flag are interpreted; every other field is
/// carried through untouched in `fields`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthEntry {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub local_id: Option<String>,
    #[serde(rename = "convexId", default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "isDeleted", default, skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl HealthEntry {
    pub fn local(local_id: impl Into<String>) -> Self {
        HealthEntry {
            local_id: Some(local_id.into()),
            ..Default::default()
        }
    }

    pub fn with_remote_id(mut self, remote_id: impl Into<String>) -> Self {
        self.remote_id = Some(remote_id.into());
        self
    }

    pub fn with_deleted(mut self, deleted: bool) -> Self {
        self.is_deleted = Some(deleted);
        self
    }
}

impl TrackedEntry for HealthEntry {
    fn remote_id(&self) -> Option<&str> {
        non_empty(&self.remote_id)
    }

    fn local_id(&self) -> Option<&str> {
        non_empty(&self.local_id)
    }

    fn generic_id(&self) -> Option<&str> {
        non_empty(&self.id)
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted == Some(true)
    }
}

// ============================================================================
// Raw JSON rows
// ============================================================================

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

impl TrackedEntry for Value {
    fn remote_id(&self) -> Option<&str> {
        str_field(self, "convexId")
    }

    fn local_id(&self) -> Option<&str> {
        str_field(self, "_id")
    }

    fn generic_id(&self) -> Option<&str> {
        str_field(self, "id")
    }

    fn is_deleted(&self) -> bool {
        self.get("isDeleted").and_then(Value::as_bool) == Some(true)
    }
}
