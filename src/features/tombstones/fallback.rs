//! Decide whether a deletion has to go through the tombstone fallback.
//!
//! A legacy row missing columns can only be repaired in place with raw SQL.
//! Adapters describe that ability through an explicit capability descriptor.

use anyhow::Result;
use log::warn;

/// Features of the local embedded database engine that matter for deletes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdapterCapabilities {
    /// Raw SQL execution is available
    pub raw_sql: bool,
}

/// Local embedded database adapter as seen by the reconciliation layer
pub trait LocalDatabaseAdapter {
    /// Probe the engine's capabilities. May fail if the engine is unhealthy.
    fn capabilities(&self) -> Result<AdapterCapabilities>;
}

/// `true` when the caller cannot self-heal a legacy row and must tombstone it.
///
/// A missing adapter or a failing probe also selects the fallback; hiding a
/// record is preferred over risking a crash.
pub fn should_use_tombstone_fallback(adapter: Option<&dyn LocalDatabaseAdapter>) -> bool {
    let Some(adapter) = adapter else {
        return true;
    };

    match adapter.capabilities() {
        Ok(capabilities) => !capabilities.raw_sql,
        Err(e) => {
            warn!("Failed to probe database adapter, using tombstone fallback: {e:#}");
            true
        }
    }
}
