//! Configuration loading and data folder resolution

use crate::{Error, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Environment variable naming the data folder.
pub const DATA_FOLDER_ENV: &str = "CERTSYNC_DATA";

/// Database file name inside the data folder.
pub const DATABASE_FILE: &str = "certsync.db";

/// Data folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable (CERTSYNC_DATA)
/// 3. TOML config file (`data_folder` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_folder(cli_arg: Option<&str>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(DATA_FOLDER_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = locate_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(folder) = config.get("data_folder").and_then(|v| v.as_str()) {
                    return PathBuf::from(folder);
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    default_data_folder()
}

/// Ensure the data folder exists and return the database path inside it.
pub fn prepare_database_path(data_folder: &PathBuf) -> Result<PathBuf> {
    std::fs::create_dir_all(data_folder)?;
    Ok(data_folder.join(DATABASE_FILE))
}

/// Resolve the listen address from CERTSYNC_BIND, defaulting to localhost.
pub fn resolve_bind_address() -> Result<SocketAddr> {
    let raw = std::env::var("CERTSYNC_BIND").unwrap_or_else(|_| "127.0.0.1:5810".to_string());
    raw.parse()
        .map_err(|_| Error::Config(format!("Invalid bind address: {}", raw)))
}

/// Get configuration file path for the platform
fn locate_config_file() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("certsync").join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/certsync/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Get OS-dependent default data folder path
fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("certsync"))
        .unwrap_or_else(|| PathBuf::from("./certsync_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_argument_wins() {
        let folder = resolve_data_folder(Some("/tmp/certsync-test"));
        assert_eq!(folder, PathBuf::from("/tmp/certsync-test"));
    }

    #[test]
    fn prepare_creates_folder_and_returns_db_path() {
        let dir = tempfile::tempdir().unwrap();
        let data_folder = dir.path().join("nested").join("data");
        let db_path = prepare_database_path(&data_folder).unwrap();
        assert!(data_folder.exists());
        assert_eq!(db_path, data_folder.join(DATABASE_FILE));
    }

    #[test]
    fn default_bind_address_is_localhost() {
        // Only meaningful when the variable is unset in the test environment.
        if std::env::var("CERTSYNC_BIND").is_err() {
            let addr = resolve_bind_address().unwrap();
            assert_eq!(addr.port(), 5810);
        }
    }
}
