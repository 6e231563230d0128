//! Issuer-side certificate records and their lifecycle status

use certsync_common::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Safety-qualification category of a training program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyCategory {
    IndustrialSafety,
    EnergySafety,
    LaborSafety,
    Ecology,
}

impl SafetyCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyCategory::IndustrialSafety => "industrial_safety",
            SafetyCategory::EnergySafety => "energy_safety",
            SafetyCategory::LaborSafety => "labor_safety",
            SafetyCategory::Ecology => "ecology",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "industrial_safety" => Ok(SafetyCategory::IndustrialSafety),
            "energy_safety" => Ok(SafetyCategory::EnergySafety),
            "labor_safety" => Ok(SafetyCategory::LaborSafety),
            "ecology" => Ok(SafetyCategory::Ecology),
            other => Err(Error::Internal(format!("Unknown category: {}", other))),
        }
    }

    /// Human-readable label used in registry exports
    pub fn label(&self) -> &'static str {
        match self {
            SafetyCategory::IndustrialSafety => "Промбезопасность",
            SafetyCategory::EnergySafety => "Энергобезопасность",
            SafetyCategory::LaborSafety => "Охрана труда",
            SafetyCategory::Ecology => "Экология",
        }
    }
}

/// Certificate lifecycle status
///
/// Status only ever moves forward in this ordering; `Synced` is terminal
/// and is reachable only through the Synchronization Engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    /// Created by manual entry or a committed bulk row
    Issued,
    /// Out-of-band delivery confirmed; client store not yet written
    Delivered,
    /// Copied into the client's compliance store (terminal)
    Synced,
}

impl CertificateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateStatus::Issued => "issued",
            CertificateStatus::Delivered => "delivered",
            CertificateStatus::Synced => "synced",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "issued" => Ok(CertificateStatus::Issued),
            "delivered" => Ok(CertificateStatus::Delivered),
            "synced" => Ok(CertificateStatus::Synced),
            other => Err(Error::Internal(format!("Unknown status: {}", other))),
        }
    }

    /// Position in the forward-only lifecycle ordering
    pub fn rank(&self) -> u8 {
        match self {
            CertificateStatus::Issued => 0,
            CertificateStatus::Delivered => 1,
            CertificateStatus::Synced => 2,
        }
    }

    /// Human-readable label used in registry exports
    pub fn label(&self) -> &'static str {
        match self {
            CertificateStatus::Issued => "Выдано",
            CertificateStatus::Delivered => "Передано клиенту",
            CertificateStatus::Synced => "Синхронизировано",
        }
    }
}

/// Input fields for issuing a certificate (manual entry or one bulk row)
///
/// The record id, status, and timestamps are assigned at insertion time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateDraft {
    pub training_center_id: Uuid,
    pub client_tenant_id: Uuid,
    pub personnel_id: Uuid,
    pub personnel_name: String,
    pub organization_id: Option<Uuid>,
    pub program_id: String,
    pub program_name: String,
    pub certificate_number: String,
    pub protocol_number: String,
    pub protocol_date: Option<NaiveDate>,
    pub issue_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub category: SafetyCategory,
    pub area: String,
    pub certificate_file_url: Option<String>,
    pub protocol_file_url: Option<String>,
    pub issued_by: String,
}

impl CertificateDraft {
    /// Field-level checks shared by manual entry and bulk commit
    pub fn validate(&self) -> Result<()> {
        if self.personnel_name.trim().is_empty() {
            return Err(Error::InvalidInput("Holder name is required".to_string()));
        }
        if self.certificate_number.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Certificate number is required".to_string(),
            ));
        }
        if self.expiry_date < self.issue_date {
            return Err(Error::InvalidInput(
                "Expiry date is before issue date".to_string(),
            ));
        }
        Ok(())
    }
}

/// Issued certificate record (issuer-side, authoritative)
///
/// Append-only: records are never deleted. A correction issues a new
/// certificate and stamps `superseded_by` on the old one, preserving the
/// client-side audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedCertificate {
    /// Generated record id, distinct from the human-assigned number
    pub id: Uuid,
    pub training_center_id: Uuid,
    pub client_tenant_id: Uuid,
    pub personnel_id: Uuid,
    /// Holder display name, denormalized at issuance time
    pub personnel_name: String,
    pub organization_id: Option<Uuid>,
    pub program_id: String,
    pub program_name: String,
    /// Real-world credential identifier, unique per training center
    pub certificate_number: String,
    pub protocol_number: String,
    pub protocol_date: Option<NaiveDate>,
    pub issue_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub category: SafetyCategory,
    pub area: String,
    pub certificate_file_url: Option<String>,
    pub protocol_file_url: Option<String>,
    pub status: CertificateStatus,
    pub issued_by: String,
    pub superseded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IssuedCertificate {
    /// Create a new record from a draft, with the given initial status
    pub fn from_draft(draft: CertificateDraft, status: CertificateStatus) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            training_center_id: draft.training_center_id,
            client_tenant_id: draft.client_tenant_id,
            personnel_id: draft.personnel_id,
            personnel_name: draft.personnel_name,
            organization_id: draft.organization_id,
            program_id: draft.program_id,
            program_name: draft.program_name,
            certificate_number: draft.certificate_number,
            protocol_number: draft.protocol_number,
            protocol_date: draft.protocol_date,
            issue_date: draft.issue_date,
            expiry_date: draft.expiry_date,
            category: draft.category,
            area: draft.area,
            certificate_file_url: draft.certificate_file_url,
            protocol_file_url: draft.protocol_file_url,
            status,
            issued_by: draft.issued_by,
            superseded_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}
