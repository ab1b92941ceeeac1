//! Result of a best-effort persisted write.

/// What happened to a mutation against persistent storage.
///
/// Storage failures are never surfaced as errors to callers of the local data
/// layer. They are logged and reported here as [`WriteOutcome::Degraded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The new state was persisted
    Applied,
    /// Nothing needed to change, so no write was issued
    Unchanged,
    /// A write was attempted and failed
    Degraded,
}

impl WriteOutcome {
    pub fn is_applied(self) -> bool {
        self == WriteOutcome::Applied
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WriteOutcome::Applied => "applied",
            WriteOutcome::Unchanged => "unchanged",
            WriteOutcome::Degraded => "degraded",
        }
    }
}

impl std::fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
