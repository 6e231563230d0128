//! Client compliance store API handlers
//!
//! Read access plus the annotation path. Records are created only by the
//! Synchronization Engine; there is deliberately no POST here.

use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::qualifications;
use crate::error::{ApiError, ApiResult};
use crate::models::QualificationRecord;
use crate::AppState;

/// GET /qualifications query
#[derive(Debug, Deserialize)]
pub struct QualificationListQuery {
    pub tenant_id: Uuid,
}

/// PATCH /qualifications/{id} request
///
/// Only the client-owned fields; issuer-derived fields are immutable on
/// this side of the boundary.
#[derive(Debug, Deserialize)]
pub struct AnnotateRequest {
    pub verified: Option<bool>,
    pub notes: Option<String>,
}

/// GET /qualifications?tenant_id=...
pub async fn list_qualifications(
    State(state): State<AppState>,
    Query(query): Query<QualificationListQuery>,
) -> ApiResult<Json<Vec<QualificationRecord>>> {
    let records = qualifications::list_qualifications_for_tenant(&state.db, query.tenant_id).await?;
    Ok(Json(records))
}

/// GET /qualifications/{id}
pub async fn get_qualification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<QualificationRecord>> {
    let record = qualifications::load_qualification(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Qualification not found: {}", id)))?;
    Ok(Json(record))
}

/// PATCH /qualifications/{id}
pub async fn annotate_qualification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AnnotateRequest>,
) -> ApiResult<Json<QualificationRecord>> {
    qualifications::annotate_qualification(&state.db, id, request.verified, request.notes).await?;

    let record = qualifications::load_qualification(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Qualification not found: {}", id)))?;
    Ok(Json(record))
}

/// Build client compliance store routes
pub fn qualification_routes() -> Router<AppState> {
    Router::new()
        .route("/qualifications", get(list_qualifications))
        .route(
            "/qualifications/:id",
            get(get_qualification).patch(annotate_qualification),
        )
}
