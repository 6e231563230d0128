//! Bulk-import commit
//!
//! Writes the operator's selected rows into the certificate store. The
//! selection was previewed row by row, but rows are re-checked here:
//! between preview and commit the store may have gained a colliding
//! certificate number, and that collision is fatal to the one row only.

use certsync_common::dates::parse_flexible_date;
use certsync_common::events::{CertSyncEvent, EventBus};
use certsync_common::{Error, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::db::{certificates, DirectoryReader};
use crate::models::{
    CandidateRow, CertificateDraft, CertificateStatus, CommitOutcome, CommitRowFailure,
    IssuedCertificate, SafetyCategory,
};
use crate::services::{sync_engine, validator};

/// Issuance context shared by every row of one bulk commit
#[derive(Debug, Clone)]
pub struct IssuanceContext {
    pub training_center_id: Uuid,
    pub training_center_name: String,
    pub client_tenant_id: Uuid,
    pub program_id: String,
    pub program_name: String,
    pub category: SafetyCategory,
    pub issued_by: String,
    /// Run the freshly issued records through the Synchronization Engine
    /// in the same action
    pub auto_sync: bool,
}

/// Commit the selected candidate rows as issued certificates
///
/// The unit of failure is the row: a duplicate certificate number or a
/// row that no longer validates is recorded in the outcome and the rest
/// of the selection proceeds. Only a storage-level failure aborts the
/// whole action.
pub async fn commit_rows(
    pool: &SqlitePool,
    directory: &DirectoryReader,
    event_bus: &EventBus,
    selection: Vec<CandidateRow>,
    ctx: IssuanceContext,
) -> Result<CommitOutcome> {
    let outcomes = validator::validate_rows(&selection);

    let mut issued_ids = Vec::new();
    let mut failures = Vec::new();

    for outcome in outcomes {
        let candidate = &outcome.candidate;

        if !outcome.is_valid() {
            failures.push(CommitRowFailure {
                line_number: candidate.line_number,
                certificate_number: candidate.certificate_number.clone(),
                reasons: outcome.reasons(),
            });
            continue;
        }

        let draft = draft_from_candidate(candidate, &ctx)?;
        let cert = IssuedCertificate::from_draft(draft, CertificateStatus::Issued);

        match certificates::insert_certificate(pool, &cert).await {
            Ok(()) => {
                event_bus.emit_lossy(CertSyncEvent::CertificateIssued {
                    certificate_id: cert.id,
                    certificate_number: cert.certificate_number.clone(),
                    client_tenant_id: cert.client_tenant_id,
                    timestamp: Utc::now(),
                });
                issued_ids.push(cert.id);
            }
            Err(Error::DuplicateCertificateNumber(number)) => {
                failures.push(CommitRowFailure {
                    line_number: candidate.line_number,
                    certificate_number: candidate.certificate_number.clone(),
                    reasons: vec![format!(
                        "Certificate number {} already registered",
                        number
                    )],
                });
            }
            // Unrecoverable storage failure: abort the whole action
            Err(e) => return Err(e),
        }

        tokio::task::yield_now().await;
    }

    info!(
        issued = issued_ids.len(),
        failed = failures.len(),
        "Bulk import committed"
    );
    event_bus.emit_lossy(CertSyncEvent::ImportCommitted {
        issued: issued_ids.len(),
        failed: failures.len(),
        timestamp: Utc::now(),
    });

    let sync = if ctx.auto_sync && !issued_ids.is_empty() {
        Some(
            sync_engine::sync_certificates(
                pool,
                directory,
                event_bus,
                &ctx.training_center_name,
                &issued_ids,
            )
            .await?,
        )
    } else {
        None
    };

    Ok(CommitOutcome {
        issued_ids,
        failures,
        sync,
    })
}

/// Build a certificate draft from a validated candidate row
///
/// Bulk rows identify the holder by display name only; a fresh personnel
/// reference is minted per row, matching how the original intake worked.
fn draft_from_candidate(candidate: &CandidateRow, ctx: &IssuanceContext) -> Result<CertificateDraft> {
    let issue_date = parse_flexible_date(&candidate.issue_date)
        .ok_or_else(|| Error::Internal("Validated row lost its issue date".to_string()))?;
    let expiry_date = parse_flexible_date(&candidate.expiry_date)
        .ok_or_else(|| Error::Internal("Validated row lost its expiry date".to_string()))?;

    Ok(CertificateDraft {
        training_center_id: ctx.training_center_id,
        client_tenant_id: ctx.client_tenant_id,
        personnel_id: Uuid::new_v4(),
        personnel_name: candidate.holder_name.clone(),
        organization_id: None,
        program_id: ctx.program_id.clone(),
        program_name: ctx.program_name.clone(),
        certificate_number: candidate.certificate_number.clone(),
        protocol_number: candidate.protocol_number.clone(),
        protocol_date: parse_flexible_date(&candidate.protocol_date),
        issue_date,
        expiry_date,
        category: ctx.category,
        area: candidate.area.clone(),
        certificate_file_url: None,
        protocol_file_url: None,
        issued_by: ctx.issued_by.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::qualifications;

    fn candidate(number: &str) -> CandidateRow {
        CandidateRow {
            line_number: 2,
            holder_name: "Иванов И.И.".to_string(),
            certificate_number: number.to_string(),
            protocol_number: "ПБ-123/2024".to_string(),
            protocol_date: "2024-01-15".to_string(),
            issue_date: "2024-01-15".to_string(),
            expiry_date: "2029-01-15".to_string(),
            area: "А.1".to_string(),
        }
    }

    fn context(tenant: Uuid, auto_sync: bool) -> IssuanceContext {
        IssuanceContext {
            training_center_id: Uuid::new_v4(),
            training_center_name: "АНО ДПО Учебный центр".to_string(),
            client_tenant_id: tenant,
            program_id: "program-1".to_string(),
            program_name: "Промышленная безопасность А.1".to_string(),
            category: SafetyCategory::IndustrialSafety,
            issued_by: "Комиссия УЦ".to_string(),
            auto_sync,
        }
    }

    async fn setup() -> (SqlitePool, DirectoryReader, EventBus) {
        let pool = certsync_common::db::connect_memory().await.unwrap();
        let directory = DirectoryReader::new(pool.clone());
        (pool, directory, EventBus::new(64))
    }

    #[tokio::test]
    async fn commits_valid_rows_as_issued() {
        let (pool, directory, bus) = setup().await;
        let tenant = Uuid::new_v4();

        let outcome = commit_rows(
            &pool,
            &directory,
            &bus,
            vec![candidate("УД-1"), candidate("УД-2")],
            context(tenant, false),
        )
        .await
        .unwrap();

        assert_eq!(outcome.issued_ids.len(), 2);
        assert!(outcome.failures.is_empty());
        assert!(outcome.sync.is_none());

        let cert = certificates::load_certificate(&pool, outcome.issued_ids[0])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cert.status, CertificateStatus::Issued);
        assert_eq!(cert.client_tenant_id, tenant);
    }

    #[tokio::test]
    async fn duplicate_at_commit_fails_that_row_only() {
        let (pool, directory, bus) = setup().await;
        let ctx = context(Uuid::new_v4(), false);

        commit_rows(&pool, &directory, &bus, vec![candidate("УД-1")], ctx.clone())
            .await
            .unwrap();
        let outcome = commit_rows(
            &pool,
            &directory,
            &bus,
            vec![candidate("УД-1"), candidate("УД-2")],
            ctx,
        )
        .await
        .unwrap();

        assert_eq!(outcome.issued_ids.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].certificate_number, "УД-1");
    }

    #[tokio::test]
    async fn invalid_rows_in_selection_are_reported_not_written() {
        let (pool, directory, bus) = setup().await;
        let mut broken = candidate("УД-1");
        broken.expiry_date = "2020-01-01".to_string();

        let outcome = commit_rows(
            &pool,
            &directory,
            &bus,
            vec![broken, candidate("УД-2")],
            context(Uuid::new_v4(), false),
        )
        .await
        .unwrap();

        assert_eq!(outcome.issued_ids.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0]
            .reasons
            .iter()
            .any(|r| r.contains("before issue date")));
    }

    #[tokio::test]
    async fn auto_sync_runs_the_engine_in_the_same_action() {
        let (pool, directory, bus) = setup().await;
        let tenant = Uuid::new_v4();
        sqlx::query("INSERT INTO organizations (guid, name, inn, tenant_id) VALUES (?, ?, ?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind("ООО Промышленность")
            .bind("7701234567")
            .bind(tenant.to_string())
            .execute(&pool)
            .await
            .unwrap();

        let outcome = commit_rows(
            &pool,
            &directory,
            &bus,
            vec![candidate("УД-1"), candidate("УД-2")],
            context(tenant, true),
        )
        .await
        .unwrap();

        let report = outcome.sync.expect("auto-sync report missing");
        assert_eq!(report.synced_count(), 2);
        assert_eq!(report.tenants_notified, 1);
        assert_eq!(
            qualifications::list_qualifications_for_tenant(&pool, tenant)
                .await
                .unwrap()
                .len(),
            2
        );
    }
}
