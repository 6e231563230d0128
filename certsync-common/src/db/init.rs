//! Table schemas for the CertSync database
//!
//! All tables are created idempotently at startup. Credential dates are
//! stored as ISO `YYYY-MM-DD` TEXT; record timestamps as RFC 3339 TEXT.

use crate::Result;
use sqlx::SqlitePool;

/// Create all tables used by the registry service
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    create_certificates_table(pool).await?;
    create_qualifications_table(pool).await?;
    create_organizations_table(pool).await?;
    create_personnel_table(pool).await?;

    tracing::info!(
        "Database tables initialized (certificates, qualifications, organizations, personnel)"
    );

    Ok(())
}

/// Issuer-side certificate registry
///
/// Append-only ledger: rows are never deleted. Corrections issue a new
/// certificate and stamp `superseded_by` on the old row. The certificate
/// number is the human-assigned credential identifier and must be unique
/// within one training center.
pub async fn create_certificates_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS certificates (
            guid TEXT PRIMARY KEY,
            training_center_id TEXT NOT NULL,
            client_tenant_id TEXT NOT NULL,
            personnel_id TEXT NOT NULL,
            personnel_name TEXT NOT NULL,
            organization_id TEXT,
            program_id TEXT NOT NULL,
            program_name TEXT NOT NULL,
            certificate_number TEXT NOT NULL,
            protocol_number TEXT NOT NULL,
            protocol_date TEXT,
            issue_date TEXT NOT NULL,
            expiry_date TEXT NOT NULL,
            category TEXT NOT NULL,
            area TEXT NOT NULL DEFAULT '',
            certificate_file_url TEXT,
            protocol_file_url TEXT,
            status TEXT NOT NULL DEFAULT 'issued',
            issued_by TEXT NOT NULL,
            superseded_by TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(training_center_id, certificate_number)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Client-side qualification records
///
/// Written only by the Synchronization Engine. `source_certificate_id` is
/// unique so a retried sync can never produce a second copy of the same
/// certificate in a tenant's store.
pub async fn create_qualifications_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS qualifications (
            guid TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            personnel_id TEXT NOT NULL,
            source_certificate_id TEXT NOT NULL UNIQUE,
            category TEXT NOT NULL,
            program_name TEXT NOT NULL,
            training_center_id TEXT NOT NULL,
            training_center_name TEXT NOT NULL,
            certificate_number TEXT NOT NULL,
            protocol_number TEXT NOT NULL,
            protocol_date TEXT,
            issue_date TEXT NOT NULL,
            expiry_date TEXT NOT NULL,
            area TEXT NOT NULL DEFAULT '',
            verified INTEGER NOT NULL DEFAULT 0,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Organization directory (read-only collaborator)
pub async fn create_organizations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS organizations (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            inn TEXT NOT NULL DEFAULT '',
            tenant_id TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Personnel directory (read-only collaborator)
pub async fn create_personnel_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS personnel (
            guid TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            organization_id TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
