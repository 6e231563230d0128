//! # CertSync Common Library
//!
//! Shared code for the CertSync services including:
//! - Database bootstrap and table schemas
//! - Event types (CertSyncEvent enum) and the EventBus
//! - Configuration loading
//! - Date parsing for credential fields
//! - SSE utilities

pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
