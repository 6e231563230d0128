//! Bulk import API handlers
//!
//! Two-step flow: preview parses and validates the pasted text without
//! touching the store; commit writes the operator's selected rows.

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::{CandidateRow, CommitOutcome, ImportPreview, SafetyCategory};
use crate::services::{import_parser, importer, validator};
use crate::AppState;

/// POST /certificates/import/preview request
#[derive(Debug, Deserialize)]
pub struct ImportPreviewRequest {
    /// Raw delimited text, header line included
    pub text: String,
    /// Single-byte field delimiter; defaults to ';'
    pub delimiter: Option<char>,
}

/// POST /certificates/import/commit request
#[derive(Debug, Deserialize)]
pub struct ImportCommitRequest {
    /// The rows the operator selected in the preview
    pub rows: Vec<CandidateRow>,
    pub client_tenant_id: Uuid,
    pub program_id: String,
    pub program_name: String,
    pub category: SafetyCategory,
    /// Run the Synchronization Engine on the fresh records in this action
    #[serde(default)]
    pub auto_sync: bool,
}

/// POST /certificates/import/preview
///
/// Pure: parses and validates only, so the operator can preview the same
/// text any number of times with identical results.
pub async fn preview_import(
    Json(request): Json<ImportPreviewRequest>,
) -> ApiResult<Json<ImportPreview>> {
    let delimiter = request
        .delimiter
        .filter(char::is_ascii)
        .map(|c| c as u8)
        .unwrap_or(import_parser::DEFAULT_DELIMITER);

    let parsed = import_parser::parse_bulk_text(&request.text, delimiter);
    let rows = validator::validate_rows(&parsed.candidates);

    Ok(Json(ImportPreview {
        rows,
        data_lines: parsed.data_lines,
        skipped_rows: parsed.skipped_rows,
    }))
}

/// POST /certificates/import/commit
///
/// Writes the selected rows as issued certificates. Per-row failures are
/// reported in the outcome; only a storage failure yields an error status.
pub async fn commit_import(
    State(state): State<AppState>,
    Json(request): Json<ImportCommitRequest>,
) -> ApiResult<Json<CommitOutcome>> {
    let ctx = importer::IssuanceContext {
        training_center_id: state.issuer.training_center_id,
        training_center_name: state.issuer.training_center_name.clone(),
        client_tenant_id: request.client_tenant_id,
        program_id: request.program_id,
        program_name: request.program_name,
        category: request.category,
        issued_by: state.issuer.issued_by.clone(),
        auto_sync: request.auto_sync,
    };

    let outcome = importer::commit_rows(
        &state.db,
        &state.directory,
        &state.event_bus,
        request.rows,
        ctx,
    )
    .await?;

    Ok(Json(outcome))
}

/// Build bulk import routes
pub fn import_routes() -> Router<AppState> {
    Router::new()
        .route("/certificates/import/preview", post(preview_import))
        .route("/certificates/import/commit", post(commit_import))
}
