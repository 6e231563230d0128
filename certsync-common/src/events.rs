//! Event types for the CertSync event system
//!
//! Provides shared event definitions and the EventBus used by the registry
//! service to surface pipeline outcomes to external consumers (SSE clients,
//! the notification surface).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// CertSync event types
///
/// Events are broadcast via EventBus and can be serialized for SSE
/// transmission. All pipeline outcomes flow through this central enum so
/// consumers get exhaustive matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CertSyncEvent {
    /// A single certificate was issued (manual entry or one bulk row)
    CertificateIssued {
        /// Generated record id of the new certificate
        certificate_id: Uuid,
        /// Human-assigned credential identifier
        certificate_number: String,
        /// Tenant that owns the receiving compliance store
        client_tenant_id: Uuid,
        /// When the record was created
        timestamp: DateTime<Utc>,
    },

    /// A bulk import commit finished
    ///
    /// Emitted once per commit action, after every selected row has been
    /// either written or recorded as failed.
    ImportCommitted {
        /// Rows written as issued certificates
        issued: usize,
        /// Rows that failed at commit time (e.g. duplicate number)
        failed: usize,
        timestamp: DateTime<Utc>,
    },

    /// Out-of-band delivery confirmation recorded for a certificate
    CertificateDelivered {
        certificate_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// A certificate was superseded by a replacement record
    CertificateSuperseded {
        /// The record that is now superseded
        certificate_id: Uuid,
        /// The replacement record
        superseded_by: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// A synchronization action finished
    ///
    /// Summarizes the whole operator action across all tenants.
    SyncCompleted {
        /// Records moved to synced in this action
        synced: usize,
        /// Records skipped because they were already synced
        already_synced: usize,
        /// Records that failed (e.g. unresolvable tenant)
        failed: usize,
        /// Tenants that received a notification
        tenants_notified: usize,
        timestamp: DateTime<Utc>,
    },

    /// Aggregate delivery notification for one tenant
    ///
    /// Exactly one of these is emitted per tenant per synchronization
    /// action, after all of that tenant's records have been written.
    /// This is the payload the external notification surface consumes.
    TenantNotified {
        /// Tenant whose compliance store received the records
        tenant_id: Uuid,
        /// Display name of the issuing training center
        training_center_name: String,
        /// Number of certificates in this tenant's batch
        certificate_count: usize,
        /// Issuer-side record ids in this tenant's batch
        certificate_ids: Vec<Uuid>,
        timestamp: DateTime<Utc>,
    },
}

/// Event bus for broadcasting CertSync events
///
/// Wraps a tokio broadcast channel. Late subscribers do not receive events
/// emitted before they subscribed.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CertSyncEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<CertSyncEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: CertSyncEvent,
    ) -> Result<usize, broadcast::error::SendError<CertSyncEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Pipeline outcomes are still returned to the caller as explicit result
    /// objects; events are a side channel, so an empty audience is fine.
    pub fn emit_lossy(&self, event: CertSyncEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
