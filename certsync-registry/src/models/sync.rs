//! Synchronization action outcome types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened to one certificate during a synchronization action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SyncDisposition {
    /// Written to the client store and flipped to synced
    Synced,
    /// Was already synced; skipped idempotently (not an error)
    AlreadySynced,
    /// Not synchronized; prior status kept, safe to retry after the
    /// underlying problem is fixed
    Failed { reason: String },
}

/// Per-record outcome of a synchronization action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRecordOutcome {
    pub certificate_id: Uuid,
    #[serde(flatten)]
    pub disposition: SyncDisposition,
}

/// Structured outcome of one operator-triggered synchronization action
///
/// Never collapses into a single fatal error: each record's fate is
/// reported individually, and a failure in one tenant's batch leaves other
/// tenants' results standing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    pub outcomes: Vec<SyncRecordOutcome>,
    /// Tenants that received exactly one aggregate notification
    pub tenants_notified: usize,
}

impl SyncReport {
    pub fn synced_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.disposition == SyncDisposition::Synced)
            .count()
    }

    pub fn already_synced_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.disposition == SyncDisposition::AlreadySynced)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.disposition, SyncDisposition::Failed { .. }))
            .count()
    }
}

/// Per-row failure recorded during bulk commit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRowFailure {
    pub line_number: u64,
    pub certificate_number: String,
    pub reasons: Vec<String>,
}

/// Result of committing selected bulk-import rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitOutcome {
    /// Record ids of certificates written as issued
    pub issued_ids: Vec<Uuid>,
    /// Rows that failed at commit time (fatal to that row only)
    pub failures: Vec<CommitRowFailure>,
    /// Present when the caller requested auto-sync at creation
    pub sync: Option<SyncReport>,
}
