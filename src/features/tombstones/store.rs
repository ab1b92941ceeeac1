//! # Tombstone Store
//!
//! Durable set of identifiers that must be treated as deleted even though the
//! local record could not be marked deleted in place. Persisted as one JSON
//! document `{"ids": [...]}` under [`TOMBSTONE_STORAGE_KEY`].
//!
//! Every mutation is a full read-modify-write of that document. Two
//! overlapping mutations from concurrent tasks can lose an update; callers
//! that need a consistent view await each call before the next.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Mutations report a WriteOutcome and emit change events
//! - 1.0.0: Initial release

use crate::core::WriteOutcome;
use crate::features::entries::{preferred_entry_id, TrackedEntry};
use crate::features::events::{ChangeKind, HealthEntryChange, HealthEntryEvents};
use crate::storage::KeyValueStore;
use anyhow::Result;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Storage key of the persisted tombstone document
pub const TOMBSTONE_STORAGE_KEY: &str = "health_entry_tombstones_v1";

#[derive(Debug, Default, Serialize, Deserialize)]
struct TombstoneDocument {
    #[serde(default)]
    ids: Vec<String>,
}

#[derive(Clone)]
pub struct TombstoneStore {
    storage: Arc<dyn KeyValueStore>,
    events: Option<HealthEntryEvents>,
}

impl TombstoneStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        TombstoneStore {
            storage,
            events: None,
        }
    }

    /// Emit change events on `events` whenever a mutation is applied
    pub fn with_events(mut self, events: HealthEntryEvents) -> Self {
        self.events = Some(events);
        self
    }

    /// Current tombstones. Missing, unreadable or malformed data reads as empty.
    pub async fn list_tombstones(&self) -> HashSet<String> {
        match self.read_ids().await {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                warn!("Failed to read tombstones, treating as empty: {e:#}");
                HashSet::new()
            }
        }
    }

    /// Add `id`. Empty ids and ids already present are no-ops.
    pub async fn add_tombstone(&self, id: &str) -> WriteOutcome {
        let outcome = self.insert_id(id).await;
        if outcome.is_applied() {
            self.notify(HealthEntryChange::now(ChangeKind::Delete));
        }
        outcome
    }

    /// Tombstone `entry` under its preferred id.
    ///
    /// The emitted `delete` change carries both the entry's remote and local ids.
    pub async fn tombstone_entry<T: TrackedEntry + ?Sized>(&self, entry: &T) -> WriteOutcome {
        let Some(id) = preferred_entry_id(entry) else {
            debug!("Entry has no identifier, nothing to tombstone");
            return WriteOutcome::Unchanged;
        };

        let outcome = self.insert_id(id).await;
        if outcome.is_applied() {
            let mut change = HealthEntryChange::now(ChangeKind::Delete);
            change.convex_id = entry.remote_id().map(str::to_string);
            change.watermelon_id = entry.local_id().map(str::to_string);
            self.notify(change);
        }
        outcome
    }

    /// Remove every id in `ids`. Writes only if the set actually changed.
    ///
    /// A failed read leaves the stored set untouched and reports `Degraded`.
    pub async fn remove_tombstones<S: AsRef<str>>(&self, ids: &[S]) -> WriteOutcome {
        if ids.is_empty() {
            return WriteOutcome::Unchanged;
        }

        let remove: HashSet<&str> = ids.iter().map(AsRef::as_ref).collect();
        let current = match self.read_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Failed to read tombstones, skipping remove: {e:#}");
                return WriteOutcome::Degraded;
            }
        };
        let remaining: Vec<String> = current
            .iter()
            .filter(|id| !remove.contains(id.as_str()))
            .cloned()
            .collect();

        let removed = current.len() - remaining.len();
        if removed == 0 {
            return WriteOutcome::Unchanged;
        }

        let outcome = self.write_ids(remaining).await;
        if outcome.is_applied() {
            debug!("Removed {removed} tombstones");
            self.notify(HealthEntryChange::now(ChangeKind::Sync));
        }
        outcome
    }

    /// Delete the persisted document entirely
    pub async fn clear_all_tombstones(&self) -> WriteOutcome {
        match self.storage.remove(TOMBSTONE_STORAGE_KEY).await {
            Ok(()) => {
                debug!("Cleared all tombstones");
                self.notify(HealthEntryChange::now(ChangeKind::Sync));
                WriteOutcome::Applied
            }
            Err(e) => {
                warn!("Failed to clear tombstones: {e:#}");
                WriteOutcome::Degraded
            }
        }
    }

    async fn insert_id(&self, id: &str) -> WriteOutcome {
        if id.is_empty() {
            return WriteOutcome::Unchanged;
        }

        // Never write over a set that could not be read
        let mut ids = match self.read_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Failed to read tombstones, skipping add: {e:#}");
                return WriteOutcome::Degraded;
            }
        };
        if ids.iter().any(|existing| existing == id) {
            return WriteOutcome::Unchanged;
        }

        ids.push(id.to_string());
        let outcome = self.write_ids(ids).await;
        if outcome.is_applied() {
            debug!("Tombstoned health entry {id}");
        }
        outcome
    }

    /// Stored ids, deduplicated. Storage errors propagate; a malformed
    /// document reads as empty.
    async fn read_ids(&self) -> Result<Vec<String>> {
        let Some(raw) = self.storage.get(TOMBSTONE_STORAGE_KEY).await? else {
            return Ok(Vec::new());
        };

        let ids = match serde_json::from_str::<TombstoneDocument>(&raw) {
            Ok(document) => {
                let mut seen = HashSet::new();
                document
                    .ids
                    .into_iter()
                    .filter(|id| !id.is_empty() && seen.insert(id.clone()))
                    .collect()
            }
            Err(e) => {
                warn!("Discarding malformed tombstone document: {e}");
                Vec::new()
            }
        };
        Ok(ids)
    }

    async fn write_ids(&self, ids: Vec<String>) -> WriteOutcome {
        let document = TombstoneDocument { ids };
        let json = match serde_json::to_string(&document) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to encode tombstones: {e}");
                return WriteOutcome::Degraded;
            }
        };

        match self.storage.set(TOMBSTONE_STORAGE_KEY, &json).await {
            Ok(()) => WriteOutcome::Applied,
            Err(e) => {
                warn!("Failed to persist tombstones: {e:#}");
                WriteOutcome::Degraded
            }
        }
    }

    fn notify(&self, change: HealthEntryChange) {
        if let Some(events) = &self.events {
            events.emit(&change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::entries::HealthEntry;
    use crate::storage::MemoryKeyValueStore;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Wraps a memory store, counting writes. Reads and writes can be made
    /// to fail independently at any point.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryKeyValueStore,
        sets: AtomicUsize,
        removes: AtomicUsize,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
    }

    impl CountingStore {
        fn failing() -> Self {
            let store = CountingStore::default();
            store.fail_reads(true);
            store.fail_writes(true);
            store
        }

        fn fail_reads(&self, fail: bool) {
            self.fail_reads.store(fail, Ordering::SeqCst);
        }

        fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        fn writes(&self) -> usize {
            self.sets.load(Ordering::SeqCst) + self.removes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl KeyValueStore for CountingStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(anyhow!("storage unavailable"));
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<()> {
            self.sets.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(anyhow!("disk full"));
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.removes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(anyhow!("storage unavailable"));
            }
            self.inner.remove(key).await
        }
    }

    fn store_with(backend: Arc<CountingStore>) -> TombstoneStore {
        TombstoneStore::new(backend)
    }

    fn record_changes(
        store: TombstoneStore,
    ) -> (TombstoneStore, Arc<Mutex<Vec<HealthEntryChange>>>) {
        let events = HealthEntryEvents::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = events.subscribe(move |change| {
            sink.lock().unwrap().push(change.clone());
            Ok(())
        });
        (store.with_events(events), seen)
    }

    #[tokio::test]
    async fn test_empty_when_nothing_stored() {
        let store = store_with(Arc::new(CountingStore::default()));
        assert!(store.list_tombstones().await.is_empty());
    }

    #[tokio::test]
    async fn test_add_list_remove_roundtrip() {
        let store = store_with(Arc::new(CountingStore::default()));

        assert_eq!(store.add_tombstone("X").await, WriteOutcome::Applied);
        assert!(store.list_tombstones().await.contains("X"));

        assert_eq!(store.remove_tombstones(&["X"]).await, WriteOutcome::Applied);
        assert!(!store.list_tombstones().await.contains("X"));
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let backend = Arc::new(CountingStore::default());
        let store = store_with(backend.clone());

        assert_eq!(store.add_tombstone("abc").await, WriteOutcome::Applied);
        assert_eq!(store.add_tombstone("abc").await, WriteOutcome::Unchanged);

        assert_eq!(backend.writes(), 1);
        let raw = backend.inner.get(TOMBSTONE_STORAGE_KEY).await.unwrap().unwrap();
        assert_eq!(raw, r#"{"ids":["abc"]}"#);
    }

    #[tokio::test]
    async fn test_add_empty_id_is_noop() {
        let backend = Arc::new(CountingStore::default());
        let store = store_with(backend.clone());

        assert_eq!(store.add_tombstone("").await, WriteOutcome::Unchanged);
        assert_eq!(backend.writes(), 0);
    }

    #[tokio::test]
    async fn test_whitespace_id_is_stored_as_is() {
        let store = store_with(Arc::new(CountingStore::default()));

        assert_eq!(store.add_tombstone(" ").await, WriteOutcome::Applied);
        assert!(store.list_tombstones().await.contains(" "));
    }

    #[tokio::test]
    async fn test_remove_empty_list_never_writes() {
        let backend = Arc::new(CountingStore::default());
        let store = store_with(backend.clone());
        store.add_tombstone("keep").await;
        let before = backend.writes();

        let none: [&str; 0] = [];
        assert_eq!(store.remove_tombstones(&none).await, WriteOutcome::Unchanged);
        assert_eq!(backend.writes(), before);
    }

    #[tokio::test]
    async fn test_remove_unknown_ids_skips_write() {
        let backend = Arc::new(CountingStore::default());
        let store = store_with(backend.clone());
        store.add_tombstone("keep").await;
        let before = backend.writes();

        assert_eq!(
            store.remove_tombstones(&["other".to_string()]).await,
            WriteOutcome::Unchanged
        );
        assert_eq!(backend.writes(), before);
        assert!(store.list_tombstones().await.contains("keep"));
    }

    #[tokio::test]
    async fn test_remove_keeps_order_of_remaining() {
        let backend = Arc::new(CountingStore::default());
        let store = store_with(backend.clone());
        for id in ["a", "b", "c", "d"] {
            store.add_tombstone(id).await;
        }

        store.remove_tombstones(&["b", "d", "zzz"]).await;

        let raw = backend.inner.get(TOMBSTONE_STORAGE_KEY).await.unwrap().unwrap();
        assert_eq!(raw, r#"{"ids":["a","c"]}"#);
    }

    #[tokio::test]
    async fn test_clear_removes_document() {
        let backend = Arc::new(CountingStore::default());
        let store = store_with(backend.clone());
        store.add_tombstone("a").await;

        assert_eq!(store.clear_all_tombstones().await, WriteOutcome::Applied);
        assert!(store.list_tombstones().await.is_empty());
        assert_eq!(backend.inner.get(TOMBSTONE_STORAGE_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_malformed_document_reads_empty() {
        let backend = Arc::new(CountingStore::default());
        backend.inner.set(TOMBSTONE_STORAGE_KEY, "{not json").await.unwrap();
        let store = store_with(backend.clone());

        assert!(store.list_tombstones().await.is_empty());
        // Discarded, not repaired
        assert_eq!(backend.writes(), 0);
        assert_eq!(
            backend.inner.get(TOMBSTONE_STORAGE_KEY).await.unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[tokio::test]
    async fn test_wrong_shape_reads_empty() {
        let backend = Arc::new(CountingStore::default());
        backend.inner.set(TOMBSTONE_STORAGE_KEY, r#"["a","b"]"#).await.unwrap();
        let store = store_with(backend);

        assert!(store.list_tombstones().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_ids_field_reads_empty() {
        let backend = Arc::new(CountingStore::default());
        backend.inner.set(TOMBSTONE_STORAGE_KEY, "{}").await.unwrap();
        let store = store_with(backend);

        assert!(store.list_tombstones().await.is_empty());
        assert_eq!(store.add_tombstone("a").await, WriteOutcome::Applied);
        assert!(store.list_tombstones().await.contains("a"));
    }

    #[tokio::test]
    async fn test_storage_failures_are_swallowed() {
        let store = store_with(Arc::new(CountingStore::failing()));

        assert!(store.list_tombstones().await.is_empty());
        assert_eq!(store.add_tombstone("a").await, WriteOutcome::Degraded);
        assert_eq!(store.clear_all_tombstones().await, WriteOutcome::Degraded);
    }

    #[tokio::test]
    async fn test_read_failure_never_overwrites_stored_set() {
        let backend = Arc::new(CountingStore::default());
        let store = store_with(backend.clone());
        store.add_tombstone("a").await;
        store.add_tombstone("b").await;
        let before = backend.writes();

        backend.fail_reads(true);
        assert_eq!(store.add_tombstone("c").await, WriteOutcome::Degraded);
        assert_eq!(
            store.tombstone_entry(&HealthEntry::local("w1")).await,
            WriteOutcome::Degraded
        );
        assert_eq!(store.remove_tombstones(&["a"]).await, WriteOutcome::Degraded);
        assert!(store.list_tombstones().await.is_empty());
        assert_eq!(backend.writes(), before);

        backend.fail_reads(false);
        let expected: HashSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        assert_eq!(store.list_tombstones().await, expected);
    }

    #[tokio::test]
    async fn test_remove_write_failure_is_degraded() {
        let backend = Arc::new(CountingStore::default());
        store_with(backend.clone()).add_tombstone("a").await;
        let (store, seen) = record_changes(store_with(backend.clone()));

        backend.fail_writes(true);
        assert_eq!(store.remove_tombstones(&["a"]).await, WriteOutcome::Degraded);
        assert!(seen.lock().unwrap().is_empty());

        backend.fail_writes(false);
        assert!(store.list_tombstones().await.contains("a"));
    }

    #[tokio::test]
    async fn test_tombstone_entry_prefers_remote_id() {
        let store = store_with(Arc::new(CountingStore::default()));
        let entry = HealthEntry::local("w1").with_remote_id("c1");

        assert_eq!(store.tombstone_entry(&entry).await, WriteOutcome::Applied);

        let tombstones = store.list_tombstones().await;
        assert!(tombstones.contains("c1"));
        assert!(!tombstones.contains("w1"));
    }

    #[tokio::test]
    async fn test_tombstone_entry_without_id_is_noop() {
        let backend = Arc::new(CountingStore::default());
        let store = store_with(backend.clone());

        assert_eq!(
            store.tombstone_entry(&HealthEntry::default()).await,
            WriteOutcome::Unchanged
        );
        assert_eq!(backend.writes(), 0);
    }

    #[tokio::test]
    async fn test_applied_mutations_emit_changes() {
        let (store, seen) = record_changes(store_with(Arc::new(CountingStore::default())));

        store
            .tombstone_entry(&HealthEntry::local("w1").with_remote_id("c1"))
            .await;
        store.add_tombstone("c1").await; // already present, no event
        store.remove_tombstones(&["c1"]).await;
        store.clear_all_tombstones().await;

        let seen = seen.lock().unwrap();
        let kinds: Vec<ChangeKind> = seen.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ChangeKind::Delete, ChangeKind::Sync, ChangeKind::Sync]);
        assert_eq!(seen[0].convex_id.as_deref(), Some("c1"));
        assert_eq!(seen[0].watermelon_id.as_deref(), Some("w1"));
        assert!(seen[0].timestamp.is_some());
    }

    #[tokio::test]
    async fn test_degraded_mutations_emit_nothing() {
        let (store, seen) = record_changes(store_with(Arc::new(CountingStore::failing())));

        store.add_tombstone("a").await;
        store.clear_all_tombstones().await;

        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persists_across_store_instances() {
        let backend = Arc::new(CountingStore::default());
        store_with(backend.clone()).add_tombstone("survivor").await;

        let reopened = store_with(backend);
        assert!(reopened.list_tombstones().await.contains("survivor"));
    }
}
