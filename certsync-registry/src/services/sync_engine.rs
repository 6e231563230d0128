//! Synchronization engine
//!
//! Advances accepted issuer-side certificates across the tenant boundary
//! into each client's compliance store. One-way, fire-and-forget: the
//! issuer is authoritative for the credential fact, the client for how it
//! is locally tracked.
//!
//! Atomicity unit is the per-tenant batch: the client-store writes and the
//! issuer-side status flips for one tenant happen in one transaction, and
//! that tenant's aggregate notification is emitted only after the commit.
//! One tenant's failure never rolls back another tenant's batch.

use std::collections::HashMap;

use certsync_common::events::{CertSyncEvent, EventBus};
use certsync_common::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{certificates, qualifications, DirectoryReader};
use crate::models::{
    CertificateStatus, IssuedCertificate, QualificationRecord, SyncDisposition,
    SyncRecordOutcome, SyncReport,
};

/// Synchronize an operator-selected set of certificates
///
/// Per record: already-synced records are skipped idempotently (operators
/// multi-select carelessly; this must never duplicate client records), a
/// dangling tenant reference fails that record only and leaves it
/// retryable, everything else is grouped by tenant and written batch by
/// batch. Exactly one `TenantNotified` event is emitted per tenant whose
/// batch committed.
pub async fn sync_certificates(
    pool: &SqlitePool,
    directory: &DirectoryReader,
    event_bus: &EventBus,
    training_center_name: &str,
    ids: &[Uuid],
) -> Result<SyncReport> {
    let mut order: Vec<Uuid> = Vec::new();
    let mut dispositions: HashMap<Uuid, SyncDisposition> = HashMap::new();
    let mut batches: HashMap<Uuid, Vec<IssuedCertificate>> = HashMap::new();

    // Resolve each record before touching any store
    for &id in ids {
        if order.contains(&id) {
            continue; // duplicate selection of the same id
        }
        order.push(id);

        let cert = match certificates::load_certificate(pool, id).await? {
            Some(cert) => cert,
            None => {
                dispositions.insert(
                    id,
                    SyncDisposition::Failed {
                        reason: "Certificate not found".to_string(),
                    },
                );
                continue;
            }
        };

        if cert.status == CertificateStatus::Synced {
            dispositions.insert(id, SyncDisposition::AlreadySynced);
            continue;
        }

        match directory.find_tenant_organization(cert.client_tenant_id).await? {
            Some(_) => batches.entry(cert.client_tenant_id).or_default().push(cert),
            None => {
                warn!(
                    certificate_id = %id,
                    tenant_id = %cert.client_tenant_id,
                    "Sync skipped record with unresolvable client tenant"
                );
                dispositions.insert(
                    id,
                    SyncDisposition::Failed {
                        reason: format!("Unknown client tenant: {}", cert.client_tenant_id),
                    },
                );
            }
        }
    }

    // Write one tenant batch at a time
    let mut tenants_notified = 0usize;
    for (tenant_id, batch) in &batches {
        match sync_tenant_batch(pool, training_center_name, batch).await {
            Ok(()) => {
                let certificate_ids: Vec<Uuid> = batch.iter().map(|c| c.id).collect();
                for &id in &certificate_ids {
                    dispositions.insert(id, SyncDisposition::Synced);
                }
                info!(
                    tenant_id = %tenant_id,
                    count = certificate_ids.len(),
                    "Tenant batch synchronized"
                );
                event_bus.emit_lossy(CertSyncEvent::TenantNotified {
                    tenant_id: *tenant_id,
                    training_center_name: training_center_name.to_string(),
                    certificate_count: certificate_ids.len(),
                    certificate_ids,
                    timestamp: Utc::now(),
                });
                tenants_notified += 1;
            }
            Err(e) => {
                // Rolled back: this tenant's records keep their prior
                // status; other tenants' outcomes stand.
                warn!(tenant_id = %tenant_id, error = %e, "Tenant batch failed");
                for cert in batch {
                    dispositions.insert(
                        cert.id,
                        SyncDisposition::Failed {
                            reason: e.to_string(),
                        },
                    );
                }
            }
        }

        // Keep the interactive surface responsive on large selections
        tokio::task::yield_now().await;
    }

    let outcomes: Vec<SyncRecordOutcome> = order
        .into_iter()
        .filter_map(|id| {
            dispositions.remove(&id).map(|disposition| SyncRecordOutcome {
                certificate_id: id,
                disposition,
            })
        })
        .collect();

    let report = SyncReport {
        outcomes,
        tenants_notified,
    };

    event_bus.emit_lossy(CertSyncEvent::SyncCompleted {
        synced: report.synced_count(),
        already_synced: report.already_synced_count(),
        failed: report.failed_count(),
        tenants_notified: report.tenants_notified,
        timestamp: Utc::now(),
    });

    Ok(report)
}

/// Write one tenant's batch atomically
///
/// For each record: append the client-side qualification (skipped when a
/// copy from an earlier partial attempt already exists) and flip the
/// issuer record to synced. Both happen in the same transaction so a
/// record can never end up half-applied.
async fn sync_tenant_batch(
    pool: &SqlitePool,
    training_center_name: &str,
    batch: &[IssuedCertificate],
) -> Result<()> {
    let mut tx = pool.begin().await?;

    for cert in batch {
        if !qualifications::exists_for_source(&mut *tx, cert.id).await? {
            let record = QualificationRecord::from_certificate(cert, training_center_name);
            qualifications::insert_qualification(&mut *tx, &record).await?;
        }
        certificates::mark_synced(&mut *tx, cert.id).await?;
    }

    tx.commit().await?;
    Ok(())
}
