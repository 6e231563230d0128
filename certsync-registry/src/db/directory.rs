//! Read-only directory lookups (organizations, personnel)
//!
//! The directories are owned by the wider compliance application; the
//! pipeline only reads them. They are injected as an explicit reader
//! rather than reached as ambient state, so the validator and sync engine
//! stay testable in isolation.

use certsync_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Organization directory entry (id, name, tax id, tenant ownership)
#[derive(Debug, Clone)]
pub struct OrganizationRef {
    pub id: Uuid,
    pub name: String,
    pub inn: String,
    pub tenant_id: Uuid,
}

/// Personnel directory entry (id, name, organization membership)
#[derive(Debug, Clone)]
pub struct PersonRef {
    pub id: Uuid,
    pub full_name: String,
    pub organization_id: Option<Uuid>,
}

/// Injected read-only view over the organization/personnel directories
#[derive(Debug, Clone)]
pub struct DirectoryReader {
    pool: SqlitePool,
}

impl DirectoryReader {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Look up an organization by directory id
    pub async fn load_organization(&self, id: Uuid) -> Result<Option<OrganizationRef>> {
        let row = sqlx::query("SELECT guid, name, inn, tenant_id FROM organizations WHERE guid = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_organization(&r)).transpose()
    }

    /// Resolve a client tenant reference to its organization
    ///
    /// A `None` here is the dangling-tenant case: the certificate stays in
    /// its prior status and the record is reported failed-but-retryable.
    pub async fn find_tenant_organization(&self, tenant_id: Uuid) -> Result<Option<OrganizationRef>> {
        let row = sqlx::query(
            "SELECT guid, name, inn, tenant_id FROM organizations WHERE tenant_id = ? LIMIT 1",
        )
        .bind(tenant_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_organization(&r)).transpose()
    }

    /// Look up a person by directory id
    pub async fn load_person(&self, id: Uuid) -> Result<Option<PersonRef>> {
        let row = sqlx::query("SELECT guid, full_name, organization_id FROM personnel WHERE guid = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let organization_id: Option<String> = row.get("organization_id");
                Ok(Some(PersonRef {
                    id: parse_uuid(row.get("guid"))?,
                    full_name: row.get("full_name"),
                    organization_id: organization_id.as_deref().map(parse_uuid).transpose()?,
                }))
            }
            None => Ok(None),
        }
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| Error::Internal(format!("Bad stored uuid '{}': {}", raw, e)))
}

fn row_to_organization(row: &SqliteRow) -> Result<OrganizationRef> {
    Ok(OrganizationRef {
        id: parse_uuid(row.get("guid"))?,
        name: row.get("name"),
        inn: row.get("inn"),
        tenant_id: parse_uuid(row.get("tenant_id"))?,
    })
}
