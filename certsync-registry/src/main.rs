//! certsync-registry - Credential Issuance & Synchronization service
//!
//! Issuer-side certificate registry for a training center: manual and bulk
//! issuance, the forward-only certificate lifecycle, synchronization into
//! client tenants' compliance stores, and the per-tenant notification
//! stream over SSE.

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use certsync_common::events::EventBus;
use certsync_registry::{AppState, IssuerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting certsync-registry service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Resolve data folder (CLI arg > env > TOML > OS default)
    let cli_arg = std::env::args().nth(1);
    let data_folder = certsync_common::config::resolve_data_folder(cli_arg.as_deref());
    let db_path = certsync_common::config::prepare_database_path(&data_folder)?;
    info!("Database: {}", db_path.display());

    let db_pool = certsync_common::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    let issuer = IssuerConfig::resolve()?;

    let event_bus = EventBus::new(100); // 100 event capacity
    info!("Event bus initialized");

    let state = AppState::new(db_pool, event_bus, issuer);
    let app = certsync_registry::build_router(state);

    let bind_address = certsync_common::config::resolve_bind_address()?;
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("Listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
