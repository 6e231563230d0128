//! Issuer identity configuration for certsync-registry
//!
//! The registry serves exactly one training center. Its identity is
//! resolved once at startup with ENV -> default priority and stamped on
//! every certificate the service issues.

use certsync_common::{Error, Result};
use tracing::{info, warn};
use uuid::Uuid;

/// Environment variable for the issuing training center id
pub const CENTER_ID_ENV: &str = "CERTSYNC_CENTER_ID";
/// Environment variable for the issuing training center display name
pub const CENTER_NAME_ENV: &str = "CERTSYNC_CENTER_NAME";
/// Environment variable for the default "issued by" commission label
pub const ISSUED_BY_ENV: &str = "CERTSYNC_ISSUED_BY";

const DEFAULT_CENTER_NAME: &str = "Учебный центр";
const DEFAULT_ISSUED_BY: &str = "Аттестационная комиссия";

/// Identity of the training center this registry instance issues for
#[derive(Debug, Clone)]
pub struct IssuerConfig {
    pub training_center_id: Uuid,
    pub training_center_name: String,
    pub issued_by: String,
}

impl IssuerConfig {
    /// Resolve the issuer identity from the environment
    ///
    /// A missing center id gets a generated one with a warning; that is
    /// fine for a scratch instance but a deployed registry must pin the
    /// id or its certificates will not group under one center.
    pub fn resolve() -> Result<Self> {
        let training_center_id = match std::env::var(CENTER_ID_ENV) {
            Ok(raw) => Uuid::parse_str(raw.trim()).map_err(|e| {
                Error::Config(format!("{} is not a valid UUID: {}", CENTER_ID_ENV, e))
            })?,
            Err(_) => {
                let generated = Uuid::new_v4();
                warn!(
                    "{} not set, using generated training center id {}",
                    CENTER_ID_ENV, generated
                );
                generated
            }
        };

        let training_center_name = std::env::var(CENTER_NAME_ENV)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_CENTER_NAME.to_string());

        let issued_by = std::env::var(ISSUED_BY_ENV)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_ISSUED_BY.to_string());

        info!(
            center_id = %training_center_id,
            center_name = %training_center_name,
            "Issuer identity resolved"
        );

        Ok(Self {
            training_center_id,
            training_center_name,
            issued_by,
        })
    }
}
