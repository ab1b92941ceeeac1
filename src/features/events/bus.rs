//! Synchronous publish/subscribe bus for health-entry changes.
//!
//! This is not a queue: there is no buffering or replay, so a handler that
//! subscribes after an emission never sees it.

use anyhow::Result;
use dashmap::DashMap;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

// ============================================================================
// Payload
// ============================================================================

/// What kind of local mutation happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Add,
    Edit,
    Delete,
    Sync,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::Add => "add",
            ChangeKind::Edit => "edit",
            ChangeKind::Delete => "delete",
            ChangeKind::Sync => "sync",
        }
    }
}

/// Immutable change notification broadcast to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthEntryChange {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub convex_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermelon_id: Option<String>,
    /// Milliseconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl HealthEntryChange {
    /// A change of `kind` with no identifiers and no timestamp
    pub fn new(kind: ChangeKind) -> Self {
        HealthEntryChange {
            kind,
            convex_id: None,
            watermelon_id: None,
            timestamp: None,
        }
    }

    /// A change of `kind` stamped with the current time
    pub fn now(kind: ChangeKind) -> Self {
        Self::new(kind).with_timestamp(chrono::Utc::now().timestamp_millis())
    }

    pub fn with_convex_id(mut self, id: impl Into<String>) -> Self {
        self.convex_id = Some(id.into());
        self
    }

    pub fn with_watermelon_id(mut self, id: impl Into<String>) -> Self {
        self.watermelon_id = Some(id.into());
        self
    }

    pub fn with_timestamp(mut self, millis: i64) -> Self {
        self.timestamp = Some(millis);
        self
    }
}

// ============================================================================
// Bus
// ============================================================================

type Handler = Arc<dyn Fn(&HealthEntryChange) -> Result<()> + Send + Sync>;

#[derive(Default)]
struct Registry {
    handlers: DashMap<u64, Handler>,
    next_id: AtomicU64,
}

/// Change event bus, cheap to clone; all clones share one subscriber set.
///
/// Construct one in the application's composition root and hand clones to
/// producers and consumers.
#[derive(Clone, Default)]
pub struct HealthEntryEvents {
    registry: Arc<Registry>,
}

/// Handle returned by [`HealthEntryEvents::subscribe`].
///
/// Dropping it does not unsubscribe; call [`Subscription::unsubscribe`].
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Remove the handler. Safe to call after the bus itself is gone.
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.handlers.remove(&self.id);
        }
    }
}

impl HealthEntryEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for every subsequent emission
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&HealthEntryChange) -> Result<()> + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.handlers.insert(id, Arc::new(handler));
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.handlers.len()
    }

    /// Invoke every current handler with `change`.
    ///
    /// Delivery order across handlers is unspecified. A handler that fails or
    /// panics is logged and does not stop delivery to the others.
    pub fn emit(&self, change: &HealthEntryChange) {
        // Snapshot first so handlers may subscribe or unsubscribe while running
        let handlers: Vec<Handler> = self
            .registry
            .handlers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let mut failures = 0usize;
        for handler in &handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(change))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failures += 1;
                    error!("Health entry '{}' handler failed: {e:#}", change.kind.as_str());
                }
                Err(_) => {
                    failures += 1;
                    error!("Health entry '{}' handler panicked", change.kind.as_str());
                }
            }
        }

        debug!(
            "Emitted health entry change '{}' (convex_id={:?}, watermelon_id={:?}) to {} subscribers, {} failed",
            change.kind.as_str(),
            change.convex_id,
            change.watermelon_id,
            handlers.len(),
            failures
        );
    }
}
