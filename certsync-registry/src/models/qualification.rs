//! Client-side qualification records
//!
//! The client tenant's own copy of a synchronized certificate. Created only
//! by the Synchronization Engine; afterwards the tenant owns it and may
//! annotate it locally without affecting the issuer's record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::certificate::{IssuedCertificate, SafetyCategory};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualificationRecord {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub personnel_id: Uuid,
    /// Back-reference to the source issued certificate, for traceability.
    /// At most one qualification record exists per source certificate.
    pub source_certificate_id: Uuid,
    pub category: SafetyCategory,
    pub program_name: String,
    pub training_center_id: Uuid,
    pub training_center_name: String,
    pub certificate_number: String,
    pub protocol_number: String,
    pub protocol_date: Option<NaiveDate>,
    pub issue_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub area: String,
    /// Client-owned verification flag, false until the tenant reviews it
    pub verified: bool,
    /// Client-local annotation, never pushed back upstream
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QualificationRecord {
    /// Derive the client-side copy from an issuer-side certificate
    pub fn from_certificate(cert: &IssuedCertificate, training_center_name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id: cert.client_tenant_id,
            personnel_id: cert.personnel_id,
            source_certificate_id: cert.id,
            category: cert.category,
            program_name: cert.program_name.clone(),
            training_center_id: cert.training_center_id,
            training_center_name: training_center_name.to_string(),
            certificate_number: cert.certificate_number.clone(),
            protocol_number: cert.protocol_number.clone(),
            protocol_date: cert.protocol_date,
            issue_date: cert.issue_date,
            expiry_date: cert.expiry_date,
            area: cert.area.clone(),
            verified: false,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}
