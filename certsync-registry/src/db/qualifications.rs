//! Client compliance store operations
//!
//! Records here originate exclusively from the Synchronization Engine.
//! After creation the tenant owns them: the annotation path updates only
//! client-owned fields and never touches the issuer-derived ones.

use certsync_common::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::models::{QualificationRecord, SafetyCategory};

const SELECT_COLUMNS: &str = "guid, tenant_id, personnel_id, source_certificate_id, category, \
     program_name, training_center_id, training_center_name, certificate_number, \
     protocol_number, protocol_date, issue_date, expiry_date, area, verified, notes, \
     created_at, updated_at";

/// Append a qualification record to a tenant's compliance store
///
/// Generic over the executor so the Synchronization Engine can run it in
/// the same transaction as the issuer-side status flip.
pub async fn insert_qualification<'e, E>(executor: E, record: &QualificationRecord) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO qualifications (
            guid, tenant_id, personnel_id, source_certificate_id, category,
            program_name, training_center_id, training_center_name, certificate_number,
            protocol_number, protocol_date, issue_date, expiry_date, area,
            verified, notes, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.id.to_string())
    .bind(record.tenant_id.to_string())
    .bind(record.personnel_id.to_string())
    .bind(record.source_certificate_id.to_string())
    .bind(record.category.as_str())
    .bind(&record.program_name)
    .bind(record.training_center_id.to_string())
    .bind(&record.training_center_name)
    .bind(&record.certificate_number)
    .bind(&record.protocol_number)
    .bind(record.protocol_date.map(|d| d.format("%Y-%m-%d").to_string()))
    .bind(record.issue_date.format("%Y-%m-%d").to_string())
    .bind(record.expiry_date.format("%Y-%m-%d").to_string())
    .bind(&record.area)
    .bind(record.verified)
    .bind(&record.notes)
    .bind(record.created_at.to_rfc3339())
    .bind(record.updated_at.to_rfc3339())
    .execute(executor)
    .await?;

    Ok(())
}

/// Check whether a source certificate already has a client-side copy
///
/// This is the retry-safety check: a repeated sync of the same record
/// must find the existing copy instead of writing a second one.
pub async fn exists_for_source<'e, E>(executor: E, source_certificate_id: Uuid) -> Result<bool>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM qualifications WHERE source_certificate_id = ?")
            .bind(source_certificate_id.to_string())
            .fetch_one(executor)
            .await?;
    Ok(count > 0)
}

/// List a tenant's qualification records, newest first
pub async fn list_qualifications_for_tenant(
    pool: &SqlitePool,
    tenant_id: Uuid,
) -> Result<Vec<QualificationRecord>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM qualifications WHERE tenant_id = ? ORDER BY created_at DESC",
        SELECT_COLUMNS
    ))
    .bind(tenant_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_qualification).collect()
}

/// Load a qualification record by id
pub async fn load_qualification(
    pool: &SqlitePool,
    id: Uuid,
) -> Result<Option<QualificationRecord>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM qualifications WHERE guid = ?",
        SELECT_COLUMNS
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(|r| row_to_qualification(&r)).transpose()
}

/// Update the client-owned fields of a qualification record
pub async fn annotate_qualification(
    pool: &SqlitePool,
    id: Uuid,
    verified: Option<bool>,
    notes: Option<String>,
) -> Result<()> {
    let existing = load_qualification(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Qualification not found: {}", id)))?;

    sqlx::query(
        "UPDATE qualifications SET verified = ?, notes = ?, updated_at = ? WHERE guid = ?",
    )
    .bind(verified.unwrap_or(existing.verified))
    .bind(notes.or(existing.notes))
    .bind(Utc::now().to_rfc3339())
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

fn row_to_qualification(row: &SqliteRow) -> Result<QualificationRecord> {
    let parse_uuid = |raw: &str| {
        Uuid::parse_str(raw).map_err(|e| Error::Internal(format!("Bad stored uuid '{}': {}", raw, e)))
    };
    let parse_date = |raw: &str| {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| Error::Internal(format!("Bad stored date '{}': {}", raw, e)))
    };

    let protocol_date: Option<String> = row.get("protocol_date");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(QualificationRecord {
        id: parse_uuid(row.get("guid"))?,
        tenant_id: parse_uuid(row.get("tenant_id"))?,
        personnel_id: parse_uuid(row.get("personnel_id"))?,
        source_certificate_id: parse_uuid(row.get("source_certificate_id"))?,
        category: SafetyCategory::parse(row.get("category"))?,
        program_name: row.get("program_name"),
        training_center_id: parse_uuid(row.get("training_center_id"))?,
        training_center_name: row.get("training_center_name"),
        certificate_number: row.get("certificate_number"),
        protocol_number: row.get("protocol_number"),
        protocol_date: protocol_date.as_deref().map(parse_date).transpose()?,
        issue_date: parse_date(row.get("issue_date"))?,
        expiry_date: parse_date(row.get("expiry_date"))?,
        area: row.get("area"),
        verified: row.get("verified"),
        notes: row.get("notes"),
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| Error::Internal(format!("Bad stored timestamp: {}", e)))?
            .with_timezone(&Utc),
        updated_at: DateTime::parse_from_rfc3339(&updated_at)
            .map_err(|e| Error::Internal(format!("Bad stored timestamp: {}", e)))?
            .with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CertificateDraft, CertificateStatus, IssuedCertificate};

    fn sample_record() -> QualificationRecord {
        let draft = CertificateDraft {
            training_center_id: Uuid::new_v4(),
            client_tenant_id: Uuid::new_v4(),
            personnel_id: Uuid::new_v4(),
            personnel_name: "Сидоров С.С.".to_string(),
            organization_id: None,
            program_id: "program-3".to_string(),
            program_name: "Работы на высоте (группа 2)".to_string(),
            certificate_number: "УПК-2024-15487".to_string(),
            protocol_number: "ОТ-487/2024".to_string(),
            protocol_date: NaiveDate::from_ymd_opt(2024, 9, 10),
            issue_date: NaiveDate::from_ymd_opt(2024, 9, 10).unwrap(),
            expiry_date: NaiveDate::from_ymd_opt(2027, 9, 10).unwrap(),
            category: SafetyCategory::LaborSafety,
            area: "Работы на высоте группа 2".to_string(),
            certificate_file_url: None,
            protocol_file_url: None,
            issued_by: "Комиссия УЦ".to_string(),
        };
        let cert = IssuedCertificate::from_draft(draft, CertificateStatus::Issued);
        QualificationRecord::from_certificate(&cert, "АНО ДПО Учебный центр")
    }

    #[tokio::test]
    async fn insert_and_list_for_tenant() {
        let pool = certsync_common::db::connect_memory().await.unwrap();
        let record = sample_record();

        insert_qualification(&pool, &record).await.expect("insert failed");

        let listed = list_qualifications_for_tenant(&pool, record.tenant_id)
            .await
            .expect("list failed");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].source_certificate_id, record.source_certificate_id);
        assert!(!listed[0].verified);
    }

    #[tokio::test]
    async fn source_uniqueness_blocks_second_copy() {
        let pool = certsync_common::db::connect_memory().await.unwrap();
        let record = sample_record();
        let mut copy = record.clone();
        copy.id = Uuid::new_v4();

        insert_qualification(&pool, &record).await.expect("insert failed");
        assert!(exists_for_source(&pool, record.source_certificate_id)
            .await
            .unwrap());
        assert!(insert_qualification(&pool, &copy).await.is_err());
    }

    #[tokio::test]
    async fn annotation_updates_only_client_fields() {
        let pool = certsync_common::db::connect_memory().await.unwrap();
        let record = sample_record();
        insert_qualification(&pool, &record).await.expect("insert failed");

        annotate_qualification(&pool, record.id, Some(true), Some("checked".to_string()))
            .await
            .expect("annotate failed");

        let loaded = load_qualification(&pool, record.id).await.unwrap().unwrap();
        assert!(loaded.verified);
        assert_eq!(loaded.notes.as_deref(), Some("checked"));
        assert_eq!(loaded.certificate_number, record.certificate_number);
    }

    #[tokio::test]
    async fn annotating_missing_record_is_not_found() {
        let pool = certsync_common::db::connect_memory().await.unwrap();
        let err = annotate_qualification(&pool, Uuid::new_v4(), Some(true), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
