//! Certificate registry API handlers
//!
//! Manual issuance, listing, delivery confirmation, supersession, and the
//! registry export. Bulk import and synchronization have their own modules.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::certificates::{self, CertificateFilter};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    CertificateDraft, CertificateStatus, IssuedCertificate, SafetyCategory, SyncReport,
};
use crate::services::{exporter, sync_engine};
use crate::AppState;
use certsync_common::events::CertSyncEvent;

/// POST /certificates request (manual entry)
///
/// The issuing center and commission come from the service's issuer
/// identity; the request carries only the per-certificate fields.
#[derive(Debug, Deserialize)]
pub struct IssueCertificateRequest {
    pub client_tenant_id: Uuid,
    /// Existing directory person, or absent to mint a standalone holder
    pub personnel_id: Option<Uuid>,
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
    /// Override for the commission label stamped on the record
    pub issued_by: Option<String>,
    /// Run the new record through the Synchronization Engine immediately
    #[serde(default)]
    pub auto_sync: bool,
}

/// POST /certificates response
#[derive(Debug, Serialize)]
pub struct IssueCertificateResponse {
    #[serde(flatten)]
    pub certificate: IssuedCertificate,
    /// Present only when the request asked for auto-sync
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncReport>,
}

/// Listing filter query for GET /certificates and the export
#[derive(Debug, Default, Deserialize)]
pub struct CertificateListQuery {
    pub client_tenant_id: Option<Uuid>,
    pub status: Option<CertificateStatus>,
}

impl CertificateListQuery {
    fn into_filter(self, training_center_id: Uuid) -> CertificateFilter {
        CertificateFilter {
            training_center_id: Some(training_center_id),
            client_tenant_id: self.client_tenant_id,
            status: self.status,
        }
    }
}

/// POST /certificates/{id}/supersede request
#[derive(Debug, Deserialize)]
pub struct SupersedeRequest {
    /// Record id of the replacement certificate
    pub superseded_by: Uuid,
}

/// POST /certificates
///
/// Manual single-certificate issuance. Returns 201 with the stored record.
pub async fn issue_certificate(
    State(state): State<AppState>,
    Json(request): Json<IssueCertificateRequest>,
) -> ApiResult<impl IntoResponse> {
    let draft = CertificateDraft {
        training_center_id: state.issuer.training_center_id,
        client_tenant_id: request.client_tenant_id,
        personnel_id: request.personnel_id.unwrap_or_else(Uuid::new_v4),
        personnel_name: request.personnel_name,
        organization_id: request.organization_id,
        program_id: request.program_id,
        program_name: request.program_name,
        certificate_number: request.certificate_number,
        protocol_number: request.protocol_number,
        protocol_date: request.protocol_date,
        issue_date: request.issue_date,
        expiry_date: request.expiry_date,
        category: request.category,
        area: request.area,
        certificate_file_url: request.certificate_file_url,
        protocol_file_url: request.protocol_file_url,
        issued_by: request.issued_by.unwrap_or_else(|| state.issuer.issued_by.clone()),
    };
    draft.validate()?;

    let cert = IssuedCertificate::from_draft(draft, CertificateStatus::Issued);
    certificates::insert_certificate(&state.db, &cert).await?;

    state.event_bus.emit_lossy(CertSyncEvent::CertificateIssued {
        certificate_id: cert.id,
        certificate_number: cert.certificate_number.clone(),
        client_tenant_id: cert.client_tenant_id,
        timestamp: Utc::now(),
    });

    tracing::info!(
        certificate_id = %cert.id,
        certificate_number = %cert.certificate_number,
        "Certificate issued"
    );

    let sync = if request.auto_sync {
        Some(
            sync_engine::sync_certificates(
                &state.db,
                &state.directory,
                &state.event_bus,
                &state.issuer.training_center_name,
                &[cert.id],
            )
            .await?,
        )
    } else {
        None
    };

    // Reload so an auto-synced record comes back with its final status
    let certificate = certificates::load_certificate(&state.db, cert.id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Certificate not found: {}", cert.id)))?;

    Ok((StatusCode::CREATED, Json(IssueCertificateResponse { certificate, sync })))
}

/// GET /certificates
pub async fn list_certificates(
    State(state): State<AppState>,
    Query(query): Query<CertificateListQuery>,
) -> ApiResult<Json<Vec<IssuedCertificate>>> {
    let filter = query.into_filter(state.issuer.training_center_id);
    let listing = certificates::list_certificates(&state.db, &filter).await?;
    Ok(Json(listing))
}

/// GET /certificates/{id}
pub async fn get_certificate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<IssuedCertificate>> {
    let cert = certificates::load_certificate(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Certificate not found: {}", id)))?;
    Ok(Json(cert))
}

/// POST /certificates/{id}/deliver
///
/// Records an out-of-band delivery confirmation (issued -> delivered).
/// A record that already moved past issued gets 409.
pub async fn deliver_certificate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<IssuedCertificate>> {
    certificates::mark_delivered(&state.db, id).await?;

    state.event_bus.emit_lossy(CertSyncEvent::CertificateDelivered {
        certificate_id: id,
        timestamp: Utc::now(),
    });

    let cert = certificates::load_certificate(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Certificate not found: {}", id)))?;
    Ok(Json(cert))
}

/// POST /certificates/{id}/supersede
///
/// Stamps a replacement onto an existing record. The old record keeps its
/// status and stays in every listing; corrections never rewrite history.
pub async fn supersede_certificate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SupersedeRequest>,
) -> ApiResult<Json<IssuedCertificate>> {
    if request.superseded_by == id {
        return Err(ApiError::BadRequest(
            "A certificate cannot supersede itself".to_string(),
        ));
    }
    certificates::load_certificate(&state.db, request.superseded_by)
        .await?
        .ok_or_else(|| {
            ApiError::BadRequest(format!(
                "Replacement certificate not found: {}",
                request.superseded_by
            ))
        })?;

    certificates::supersede_certificate(&state.db, id, request.superseded_by).await?;

    state.event_bus.emit_lossy(CertSyncEvent::CertificateSuperseded {
        certificate_id: id,
        superseded_by: request.superseded_by,
        timestamp: Utc::now(),
    });

    let cert = certificates::load_certificate(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Certificate not found: {}", id)))?;
    Ok(Json(cert))
}

/// GET /certificates/export
///
/// Returns the filtered registry as a semicolon-delimited file.
pub async fn export_certificates(
    State(state): State<AppState>,
    Query(query): Query<CertificateListQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = query.into_filter(state.issuer.training_center_id);
    let body = exporter::export_certificates(&state.db, &state.directory, &filter).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"certificates.csv\"",
            ),
        ],
        body,
    ))
}

/// Build certificate registry routes
pub fn certificate_routes() -> Router<AppState> {
    Router::new()
        .route("/certificates", post(issue_certificate).get(list_certificates))
        .route("/certificates/export", get(export_certificates))
        .route("/certificates/:id", get(get_certificate))
        .route("/certificates/:id/deliver", post(deliver_certificate))
        .route("/certificates/:id/supersede", post(supersede_certificate))
}
