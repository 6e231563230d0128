//! certsync-registry library interface
//!
//! Exposes the pipeline modules and the router builder for integration
//! testing.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::config::IssuerConfig;
pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;

use crate::db::DirectoryReader;
use certsync_common::events::EventBus;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Read-only view of the organization/personnel directory
    pub directory: DirectoryReader,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Identity of the training center this instance issues for
    pub issuer: IssuerConfig,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, event_bus: EventBus, issuer: IssuerConfig) -> Self {
        let directory = DirectoryReader::new(db.clone());
        Self {
            db,
            directory,
            event_bus,
            issuer,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::certificate_routes())
        .merge(api::import_routes())
        .merge(api::sync_routes())
        .merge(api::qualification_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
