//! HTTP API handlers for certsync-registry

pub mod certificates;
pub mod events;
pub mod health;
pub mod import;
pub mod qualifications;
pub mod sync;

pub use certificates::certificate_routes;
pub use events::event_stream;
pub use health::health_routes;
pub use import::import_routes;
pub use qualifications::qualification_routes;
pub use sync::sync_routes;
