//! Certificate store operations
//!
//! The authoritative issuer-side registry. Append-only: nothing here ever
//! deletes a row, and the status UPDATE statements guard on the prior status
//! so a record can never move backwards in its lifecycle.

use certsync_common::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::models::{CertificateStatus, IssuedCertificate, SafetyCategory};

/// Listing filter for the registry
#[derive(Debug, Clone, Default)]
pub struct CertificateFilter {
    pub training_center_id: Option<Uuid>,
    pub client_tenant_id: Option<Uuid>,
    pub status: Option<CertificateStatus>,
}

const SELECT_COLUMNS: &str = "guid, training_center_id, client_tenant_id, personnel_id, \
     personnel_name, organization_id, program_id, program_name, certificate_number, \
     protocol_number, protocol_date, issue_date, expiry_date, category, area, \
     certificate_file_url, protocol_file_url, status, issued_by, superseded_by, \
     created_at, updated_at";

/// Save a new certificate record
///
/// The certificate number must be unique within the issuing training
/// center; a collision is a typed error so bulk commit can fail the one
/// row instead of the whole batch.
pub async fn insert_certificate(pool: &SqlitePool, cert: &IssuedCertificate) -> Result<()> {
    if certificate_number_exists(
        pool,
        cert.training_center_id,
        &cert.certificate_number,
    )
    .await?
    {
        return Err(Error::DuplicateCertificateNumber(
            cert.certificate_number.clone(),
        ));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO certificates (
            guid, training_center_id, client_tenant_id, personnel_id, personnel_name,
            organization_id, program_id, program_name, certificate_number, protocol_number,
            protocol_date, issue_date, expiry_date, category, area,
            certificate_file_url, protocol_file_url, status, issued_by, superseded_by,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(cert.id.to_string())
    .bind(cert.training_center_id.to_string())
    .bind(cert.client_tenant_id.to_string())
    .bind(cert.personnel_id.to_string())
    .bind(&cert.personnel_name)
    .bind(cert.organization_id.map(|id| id.to_string()))
    .bind(&cert.program_id)
    .bind(&cert.program_name)
    .bind(&cert.certificate_number)
    .bind(&cert.protocol_number)
    .bind(cert.protocol_date.map(format_date))
    .bind(format_date(cert.issue_date))
    .bind(format_date(cert.expiry_date))
    .bind(cert.category.as_str())
    .bind(&cert.area)
    .bind(&cert.certificate_file_url)
    .bind(&cert.protocol_file_url)
    .bind(cert.status.as_str())
    .bind(&cert.issued_by)
    .bind(cert.superseded_by.map(|id| id.to_string()))
    .bind(cert.created_at.to_rfc3339())
    .bind(cert.updated_at.to_rfc3339())
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        // Concurrent insert of the same number lands on the UNIQUE index
        Err(sqlx::Error::Database(db_err))
            if db_err.kind() == sqlx::error::ErrorKind::UniqueViolation =>
        {
            Err(Error::DuplicateCertificateNumber(
                cert.certificate_number.clone(),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

/// Load a certificate by record id
pub async fn load_certificate(pool: &SqlitePool, id: Uuid) -> Result<Option<IssuedCertificate>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM certificates WHERE guid = ?",
        SELECT_COLUMNS
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(|r| row_to_certificate(&r)).transpose()
}

/// List certificates matching the filter, newest first
pub async fn list_certificates(
    pool: &SqlitePool,
    filter: &CertificateFilter,
) -> Result<Vec<IssuedCertificate>> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {} FROM certificates WHERE 1 = 1",
        SELECT_COLUMNS
    ));

    if let Some(tc) = filter.training_center_id {
        builder.push(" AND training_center_id = ").push_bind(tc.to_string());
    }
    if let Some(tenant) = filter.client_tenant_id {
        builder.push(" AND client_tenant_id = ").push_bind(tenant.to_string());
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    builder.push(" ORDER BY created_at DESC, certificate_number");

    let rows = builder.build().fetch_all(pool).await?;
    rows.iter().map(row_to_certificate).collect()
}

/// Check whether a certificate number is already registered for a center
pub async fn certificate_number_exists(
    pool: &SqlitePool,
    training_center_id: Uuid,
    certificate_number: &str,
) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM certificates WHERE training_center_id = ? AND certificate_number = ?",
    )
    .bind(training_center_id.to_string())
    .bind(certificate_number)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// Record an out-of-band delivery confirmation (issued -> delivered)
///
/// Only valid from `issued`; anything else is refused so the lifecycle
/// stays forward-only.
pub async fn mark_delivered(pool: &SqlitePool, id: Uuid) -> Result<()> {
    let result = sqlx::query(
        "UPDATE certificates SET status = 'delivered', updated_at = ? \
         WHERE guid = ? AND status = 'issued'",
    )
    .bind(Utc::now().to_rfc3339())
    .bind(id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return match load_certificate(pool, id).await? {
            None => Err(Error::NotFound(format!("Certificate not found: {}", id))),
            Some(cert) => Err(Error::InvalidTransition(format!(
                "Certificate {} is {}, cannot mark delivered",
                id,
                cert.status.as_str()
            ))),
        };
    }
    Ok(())
}

/// Flip a certificate to synced (issued | delivered -> synced)
///
/// Runs inside the per-tenant sync transaction; generic over the executor
/// so the engine can pair it with the client-store write atomically.
pub async fn mark_synced<'e, E>(executor: E, id: Uuid) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE certificates SET status = 'synced', updated_at = ? \
         WHERE guid = ? AND status IN ('issued', 'delivered')",
    )
    .bind(Utc::now().to_rfc3339())
    .bind(id.to_string())
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::InvalidTransition(format!(
            "Certificate {} is not in a syncable status",
            id
        )));
    }
    Ok(())
}

/// Stamp a certificate as superseded by a replacement record
///
/// Valid in any status (including synced): supersession is the only
/// permitted "change" to a synced record, and it never rewrites history.
pub async fn supersede_certificate(
    pool: &SqlitePool,
    id: Uuid,
    superseded_by: Uuid,
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE certificates SET superseded_by = ?, updated_at = ? WHERE guid = ?",
    )
    .bind(superseded_by.to_string())
    .bind(Utc::now().to_rfc3339())
    .bind(id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Certificate not found: {}", id)));
    }
    Ok(())
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_stored_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| Error::Internal(format!("Bad stored date '{}': {}", raw, e)))
}

fn parse_stored_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| Error::Internal(format!("Bad stored uuid '{}': {}", raw, e)))
}

fn parse_stored_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Bad stored timestamp '{}': {}", raw, e)))
}

fn row_to_certificate(row: &SqliteRow) -> Result<IssuedCertificate> {
    let protocol_date: Option<String> = row.get("protocol_date");
    let organization_id: Option<String> = row.get("organization_id");
    let superseded_by: Option<String> = row.get("superseded_by");

    Ok(IssuedCertificate {
        id: parse_stored_uuid(row.get("guid"))?,
        training_center_id: parse_stored_uuid(row.get("training_center_id"))?,
        client_tenant_id: parse_stored_uuid(row.get("client_tenant_id"))?,
        personnel_id: parse_stored_uuid(row.get("personnel_id"))?,
        personnel_name: row.get("personnel_name"),
        organization_id: organization_id
            .as_deref()
            .map(parse_stored_uuid)
            .transpose()?,
        program_id: row.get("program_id"),
        program_name: row.get("program_name"),
        certificate_number: row.get("certificate_number"),
        protocol_number: row.get("protocol_number"),
        protocol_date: protocol_date.as_deref().map(parse_stored_date).transpose()?,
        issue_date: parse_stored_date(row.get("issue_date"))?,
        expiry_date: parse_stored_date(row.get("expiry_date"))?,
        category: SafetyCategory::parse(row.get("category"))?,
        area: row.get("area"),
        certificate_file_url: row.get("certificate_file_url"),
        protocol_file_url: row.get("protocol_file_url"),
        status: CertificateStatus::parse(row.get("status"))?,
        issued_by: row.get("issued_by"),
        superseded_by: superseded_by.as_deref().map(parse_stored_uuid).transpose()?,
        created_at: parse_stored_timestamp(row.get("created_at"))?,
        updated_at: parse_stored_timestamp(row.get("updated_at"))?,
    })
}
