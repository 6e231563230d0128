//! Synchronization API handler

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::SyncReport;
use crate::services::sync_engine;
use crate::AppState;

/// POST /certificates/sync request
#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    /// Issuer-side record ids selected for synchronization
    pub certificate_ids: Vec<Uuid>,
}

/// POST /certificates/sync
///
/// Runs the selected records through the Synchronization Engine. The
/// response reports every record's disposition; per-record failures (an
/// unknown id, an unresolvable tenant) never fail the request.
pub async fn sync_certificates(
    State(state): State<AppState>,
    Json(request): Json<SyncRequest>,
) -> ApiResult<Json<SyncReport>> {
    if request.certificate_ids.is_empty() {
        return Err(ApiError::BadRequest(
            "No certificates selected for synchronization".to_string(),
        ));
    }

    let report = sync_engine::sync_certificates(
        &state.db,
        &state.directory,
        &state.event_bus,
        &state.issuer.training_center_name,
        &request.certificate_ids,
    )
    .await?;

    Ok(Json(report))
}

/// Build synchronization routes
pub fn sync_routes() -> Router<AppState> {
    Router::new().route("/certificates/sync", post(sync_certificates))
}
