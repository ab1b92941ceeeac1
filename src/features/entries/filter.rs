//! Active-record filter.
//!
//! Pure projection of cached entries down to the visible ones. It does not
//! cache the tombstone set; callers pass a freshly read snapshot.

use crate::features::entries::identity::{is_entry_tombstoned, TrackedEntry};
use serde_json::Value;
use std::collections::HashSet;

/// Keep entries that are neither flagged deleted nor tombstoned.
///
/// `None` yields an empty list. Relative order is preserved.
pub fn filter_active_health_entries<T: TrackedEntry>(
    entries: Option<Vec<T>>,
    tombstones: &HashSet<String>,
) -> Vec<T> {
    let Some(entries) = entries else {
        return Vec::new();
    };

    entries
        .into_iter()
        .filter(|entry| !entry.is_deleted() && !is_entry_tombstoned(entry, tombstones))
        .collect()
}

/// Same as [`filter_active_health_entries`] for raw JSON.
///
/// Anything other than an array (null, object, scalar) yields an empty list.
pub fn filter_active_json(entries: &Value, tombstones: &HashSet<String>) -> Vec<Value> {
    filter_active_health_entries(entries.as_array().cloned(), tombstones)
}
